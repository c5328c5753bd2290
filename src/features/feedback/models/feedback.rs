use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Rating left by the ticket creator once the work is done. One per ticket.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TicketFeedback {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub created_by: Uuid,
    pub technician_id: Uuid,
    pub overall_rating: i16,
    pub response_speed_rating: Option<i16>,
    pub work_quality_rating: Option<i16>,
    pub politeness_rating: Option<i16>,
    pub cleanliness_rating: Option<i16>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl TicketFeedback {
    /// Mean of the overall rating and every sub-rating given
    pub fn average_rating(&self) -> f64 {
        let ratings: Vec<i16> = [
            Some(self.overall_rating),
            self.response_speed_rating,
            self.work_quality_rating,
            self.politeness_rating,
            self.cleanliness_rating,
        ]
        .into_iter()
        .flatten()
        .collect();

        ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub ticket_id: Uuid,
    pub created_by: Uuid,
    pub technician_id: Uuid,
    pub overall_rating: i16,
    pub response_speed_rating: Option<i16>,
    pub work_quality_rating: Option<i16>,
    pub politeness_rating: Option<i16>,
    pub cleanliness_rating: Option<i16>,
    pub comment: String,
}
