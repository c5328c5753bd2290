use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request DTO for rating a finished ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmitFeedbackDto {
    #[validate(range(min = 1, max = 5, message = "Overall rating must be 1-5"))]
    pub overall_rating: i16,

    #[validate(range(min = 1, max = 5, message = "Response speed rating must be 1-5"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_speed_rating: Option<i16>,

    #[validate(range(min = 1, max = 5, message = "Work quality rating must be 1-5"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_quality_rating: Option<i16>,

    #[validate(range(min = 1, max = 5, message = "Politeness rating must be 1-5"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub politeness_rating: Option<i16>,

    #[validate(range(min = 1, max = 5, message = "Cleanliness rating must be 1-5"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanliness_rating: Option<i16>,

    #[validate(length(max = 500, message = "Comment must not exceed 500 characters"))]
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let ok = SubmitFeedbackDto {
            overall_rating: 5,
            work_quality_rating: Some(1),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let zero = SubmitFeedbackDto {
            overall_rating: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let bad_sub = SubmitFeedbackDto {
            overall_rating: 4,
            politeness_rating: Some(6),
            ..Default::default()
        };
        assert!(bad_sub.validate().is_err());
    }

    #[test]
    fn test_comment_length() {
        let long = SubmitFeedbackDto {
            overall_rating: 3,
            comment: "x".repeat(501),
            ..Default::default()
        };
        assert!(long.validate().is_err());
    }
}
