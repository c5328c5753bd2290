use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::dispatch::models::CreateAssignmentRule;

/// Request DTO for replacing the active assignment rule
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAssignmentRuleDto {
    #[validate(range(min = 1, message = "Max open tickets must be at least 1"))]
    pub max_open_tickets: i32,

    #[validate(range(min = 0.0, message = "Distance weight must not be negative"))]
    pub weight_distance: f64,

    #[validate(range(min = 0.0, message = "Workload weight must not be negative"))]
    pub weight_workload: f64,
}

impl From<UpdateAssignmentRuleDto> for CreateAssignmentRule {
    fn from(dto: UpdateAssignmentRuleDto) -> Self {
        Self {
            max_open_tickets: dto.max_open_tickets,
            weight_distance: dto.weight_distance,
            weight_workload: dto.weight_workload,
        }
    }
}
