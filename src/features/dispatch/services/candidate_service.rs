use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::dispatch::models::{AssignmentRule, Candidate};
use crate::features::technicians::models::Availability;
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::features::tickets::repository::TicketRepository;

/// Outcome of filtering the roster
#[derive(Debug, Clone, PartialEq)]
pub enum CandidatePool {
    Candidates(Vec<Candidate>),
    /// Nobody qualifies; carries the reason recorded in history
    Empty { reason: String },
}

/// Narrows the technician roster to those available and under capacity
pub struct CandidateFilter {
    roster: Arc<dyn TechnicianRoster>,
    presence: Arc<dyn PresenceRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl CandidateFilter {
    pub fn new(
        roster: Arc<dyn TechnicianRoster>,
        presence: Arc<dyn PresenceRepository>,
        tickets: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            roster,
            presence,
            tickets,
        }
    }

    /// Candidates in technician-id order, which fixes the scoring tie-break.
    ///
    /// `for_ticket` is excluded from open counts so re-dispatching an already
    /// assigned ticket does not count against its current technician.
    /// Technicians in `excluded` (e.g. one who just declined) are skipped.
    pub async fn candidates(
        &self,
        rule: &AssignmentRule,
        for_ticket: Option<Uuid>,
        excluded: &[Uuid],
    ) -> Result<CandidatePool> {
        let mut roster: Vec<_> = self
            .roster
            .list_technicians()
            .await?
            .into_iter()
            .filter(|t| t.is_dispatchable())
            .collect();

        if roster.is_empty() {
            return Ok(CandidatePool::Empty {
                reason: "no active technicians in the roster".to_string(),
            });
        }

        roster.sort_by_key(|t| t.id);

        let mut candidates = Vec::with_capacity(roster.len());
        let mut unavailable = 0usize;
        let mut full = 0usize;
        let mut declined = 0usize;

        for technician in roster {
            if excluded.contains(&technician.id) {
                declined += 1;
                continue;
            }

            let presence = self.presence.find(technician.id).await?;
            let availability = Availability::from_presence(presence.as_ref());
            if !availability.accepts_work() {
                unavailable += 1;
                continue;
            }

            let open_tickets = self
                .tickets
                .count_open_assigned(technician.id, for_ticket)
                .await?;

            if open_tickets >= rule.max_open_tickets as i64 {
                tracing::debug!(
                    "Technician {} at capacity ({}/{})",
                    technician.id,
                    open_tickets,
                    rule.max_open_tickets
                );
                full += 1;
                continue;
            }

            candidates.push(Candidate {
                location: availability.location(),
                technician,
                open_tickets,
            });
        }

        if candidates.is_empty() {
            let mut reason = format!(
                "all technicians are unavailable or at capacity ({} unavailable, {} at capacity",
                unavailable, full
            );
            if declined > 0 {
                reason.push_str(&format!(", {} declined", declined));
            }
            reason.push(')');
            return Ok(CandidatePool::Empty { reason });
        }

        Ok(CandidatePool::Candidates(candidates))
    }
}
