use crate::features::dispatch::models::{AssignmentRule, Candidate, ScoredCandidate};
use crate::shared::constants::{
    PROXIMITY_MID_KM, PROXIMITY_NEAR_KM, PROXIMITY_SCORE_FAR, PROXIMITY_SCORE_MID,
    PROXIMITY_SCORE_NEAR, PROXIMITY_SCORE_NEUTRAL,
};
use crate::shared::geo::{self, GeoPoint};

/// Step function over distance: <=1km 1.0, <=5km 0.5, beyond 0.1
pub fn proximity_score(distance_km: Option<f64>) -> f64 {
    match distance_km {
        Some(d) if d <= PROXIMITY_NEAR_KM => PROXIMITY_SCORE_NEAR,
        Some(d) if d <= PROXIMITY_MID_KM => PROXIMITY_SCORE_MID,
        Some(_) => PROXIMITY_SCORE_FAR,
        None => PROXIMITY_SCORE_NEUTRAL,
    }
}

/// `1 - open/max`: an idle technician scores 1.0
pub fn workload_score(open_tickets: i64, max_open_tickets: i32) -> f64 {
    1.0 - (open_tickets as f64 / max_open_tickets as f64)
}

pub fn score_candidate(
    ticket_location: Option<GeoPoint>,
    candidate: &Candidate,
    rule: &AssignmentRule,
) -> ScoredCandidate {
    let distance_km = match (ticket_location, candidate.location) {
        (Some(ticket), Some(tech)) => Some(geo::distance_km(&ticket, &tech)),
        _ => None,
    };

    let proximity = proximity_score(distance_km);
    let workload = workload_score(candidate.open_tickets, rule.max_open_tickets);
    let score = proximity * rule.weight_distance + workload * rule.weight_workload;

    ScoredCandidate {
        technician_id: candidate.technician.id,
        technician_name: candidate.technician.name().to_string(),
        open_tickets: candidate.open_tickets,
        distance_km,
        proximity_score: proximity,
        workload_score: workload,
        score,
    }
}

/// Score every candidate, keeping input order
pub fn score_candidates(
    ticket_location: Option<GeoPoint>,
    candidates: &[Candidate],
    rule: &AssignmentRule,
) -> Vec<ScoredCandidate> {
    candidates
        .iter()
        .map(|c| score_candidate(ticket_location, c, rule))
        .collect()
}

/// Highest score wins. Only a strictly higher score displaces the current
/// best, so on ties the earliest candidate wins.
pub fn select_best(scored: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
    let mut best: Option<ScoredCandidate> = None;

    for candidate in scored {
        let replace = match &best {
            Some(current) => candidate.score > current.score,
            None => true,
        };
        if replace {
            best = Some(candidate);
        }
    }

    best
}
