use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::constants::{
    DEFAULT_MAX_OPEN_TICKETS, DEFAULT_WEIGHT_DISTANCE, DEFAULT_WEIGHT_WORKLOAD,
};

/// Scoring configuration. Exactly one rule is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AssignmentRule {
    pub id: Uuid,
    pub max_open_tickets: i32,
    pub weight_distance: f64,
    pub weight_workload: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AssignmentRule {
    /// The rule materialised when none is active: max 5, distance 0.6, workload 0.4
    pub fn default_rule(now: DateTime<Utc>) -> Self {
        Self::from_values(&CreateAssignmentRule::default(), now)
    }

    pub fn from_values(values: &CreateAssignmentRule, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            max_open_tickets: values.max_open_tickets,
            weight_distance: values.weight_distance,
            weight_workload: values.weight_workload,
            is_active: true,
            created_at: now,
        }
    }

    /// Upper bound of a candidate's composite score under this rule
    pub fn max_score(&self) -> f64 {
        self.weight_distance + self.weight_workload
    }
}

/// Values for a new active rule
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAssignmentRule {
    pub max_open_tickets: i32,
    pub weight_distance: f64,
    pub weight_workload: f64,
}

impl Default for CreateAssignmentRule {
    fn default() -> Self {
        Self {
            max_open_tickets: DEFAULT_MAX_OPEN_TICKETS,
            weight_distance: DEFAULT_WEIGHT_DISTANCE,
            weight_workload: DEFAULT_WEIGHT_WORKLOAD,
        }
    }
}
