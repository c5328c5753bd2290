use serde::Serialize;
use uuid::Uuid;

use crate::features::technicians::models::Technician;
use crate::shared::geo::GeoPoint;

/// A technician who passed the availability and capacity filter
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub technician: Technician,
    pub location: Option<GeoPoint>,
    pub open_tickets: i64,
}

/// A candidate with its composite score under the active rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub technician_id: Uuid,
    pub technician_name: String,
    pub open_tickets: i64,
    /// `None` when either location is unknown
    pub distance_km: Option<f64>,
    pub proximity_score: f64,
    pub workload_score: f64,
    pub score: f64,
}

impl ScoredCandidate {
    /// Human-readable reason recorded in the history comment
    pub fn rationale(&self) -> String {
        let distance = self
            .distance_km
            .map(|d| format!("{:.1}km", d))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "assigned to {} (distance: {}, open tickets: {}, score: {:.2})",
            self.technician_name, distance, self.open_tickets, self.score
        )
    }
}

/// Result of one dispatch call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Assigned(ScoredCandidate),
    Unassigned { reason: String },
}

impl DispatchOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, DispatchOutcome::Assigned(_))
    }
}
