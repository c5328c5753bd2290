use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::core::config::DispatchConfig;
use crate::core::error::{AppError, Result};
use crate::features::dispatch::models::{AssignmentRule, DispatchOutcome};
use crate::features::dispatch::services::candidate_service::{CandidateFilter, CandidatePool};
use crate::features::dispatch::services::priority_service::PriorityScorer;
use crate::features::dispatch::services::scoring;
use crate::features::notifications::{deliver, NotificationKind, NotificationPayload, Notifier};
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::features::tickets::models::{
    CapacityGuard, NewStatusHistory, Ticket, TicketChange, TicketStatus, TicketStatusHistory,
};
use crate::features::tickets::repository::TicketRepository;

/// What a dispatch call committed
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub ticket: Ticket,
    pub outcome: DispatchOutcome,
    pub history: TicketStatusHistory,
}

impl DispatchReport {
    pub fn assigned(&self) -> bool {
        self.outcome.is_assigned()
    }
}

/// Summary of a re-dispatch sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub attempted: usize,
    pub assigned: usize,
    pub failed: usize,
}

/// Automatic dispatch: score the ticket, pick a technician (or record that
/// none is available) and commit the decision with its history row.
pub struct Dispatcher {
    tickets: Arc<dyn TicketRepository>,
    scorer: PriorityScorer,
    filter: CandidateFilter,
    notifier: Arc<dyn Notifier>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        roster: Arc<dyn TechnicianRoster>,
        presence: Arc<dyn PresenceRepository>,
        notifier: Arc<dyn Notifier>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            scorer: PriorityScorer::new(Arc::clone(&tickets)),
            filter: CandidateFilter::new(roster, presence, Arc::clone(&tickets)),
            tickets,
            notifier,
            config,
        }
    }

    /// Dispatch a PENDING ticket under `rule`.
    ///
    /// Each call replaces the ticket's assignment outright. If another writer
    /// changes the ticket or fills the chosen technician between selection and
    /// commit, selection is re-run up to `max_commit_attempts` times.
    pub async fn dispatch(&self, ticket_id: Uuid, rule: &AssignmentRule) -> Result<DispatchReport> {
        self.dispatch_excluding(ticket_id, rule, &[]).await
    }

    /// Re-dispatch after `declined_by` handed the ticket back. The decliner
    /// stays in the pool unless `exclude_decliner` is configured.
    pub async fn redispatch_after_decline(
        &self,
        ticket_id: Uuid,
        rule: &AssignmentRule,
        declined_by: Uuid,
    ) -> Result<DispatchReport> {
        if self.config.exclude_decliner {
            self.dispatch_excluding(ticket_id, rule, &[declined_by]).await
        } else {
            self.dispatch(ticket_id, rule).await
        }
    }

    /// Like [`Dispatcher::dispatch`], leaving the given technicians out of the pool
    async fn dispatch_excluding(
        &self,
        ticket_id: Uuid,
        rule: &AssignmentRule,
        excluded: &[Uuid],
    ) -> Result<DispatchReport> {
        let attempts = self.config.max_commit_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.try_dispatch(ticket_id, rule, excluded).await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "Dispatch of ticket {} lost a commit race (attempt {}/{}): {}",
                        ticket_id,
                        attempt,
                        attempts,
                        e
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_dispatch(
        &self,
        ticket_id: Uuid,
        rule: &AssignmentRule,
        excluded: &[Uuid],
    ) -> Result<DispatchReport> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_id)))?;

        if ticket.status != TicketStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: ticket.status,
                to: TicketStatus::Pending,
            });
        }

        let priority_score = self.scorer.score(&ticket, Utc::now()).await?;

        match self.filter.candidates(rule, Some(ticket.id), excluded).await? {
            CandidatePool::Empty { reason } => {
                let history = NewStatusHistory::new(
                    None,
                    TicketStatus::Pending,
                    None,
                    format!("no technician available: {}", reason),
                );
                let mut change = TicketChange::from_ticket(&ticket, history);
                change.assigned_to = None;
                change.priority_score = priority_score;

                let (ticket, history) = self.tickets.apply_change(change).await?;

                tracing::warn!("Ticket {} could not be assigned: {}", ticket.id, reason);

                Ok(DispatchReport {
                    ticket,
                    outcome: DispatchOutcome::Unassigned { reason },
                    history,
                })
            }
            CandidatePool::Candidates(candidates) => {
                let scored = scoring::score_candidates(ticket.location, &candidates, rule);
                for s in &scored {
                    tracing::debug!(
                        "Ticket {} candidate {}: distance={:?}km open={} score={:.3}",
                        ticket.id,
                        s.technician_id,
                        s.distance_km,
                        s.open_tickets,
                        s.score
                    );
                }

                let winner = scoring::select_best(scored).ok_or_else(|| {
                    AppError::Internal("non-empty candidate pool produced no winner".to_string())
                })?;

                let history = NewStatusHistory::new(
                    Some(ticket.status),
                    TicketStatus::Pending,
                    None,
                    winner.rationale(),
                );
                let mut change = TicketChange::from_ticket(&ticket, history);
                change.assigned_to = Some(winner.technician_id);
                change.priority_score = priority_score;
                change.capacity_guard = Some(CapacityGuard {
                    technician_id: winner.technician_id,
                    max_open_tickets: rule.max_open_tickets,
                });

                let (ticket, history) = self.tickets.apply_change(change).await?;

                tracing::info!(
                    "Ticket {} dispatched to {}: {}",
                    ticket.id,
                    winner.technician_id,
                    history.comment
                );

                deliver(
                    &self.notifier,
                    winner.technician_id,
                    NotificationKind::Assigned,
                    NotificationPayload::new(
                        ticket.id,
                        "New job assigned",
                        format!("You have been assigned: {}", ticket.title),
                    ),
                )
                .await;

                Ok(DispatchReport {
                    ticket,
                    outcome: DispatchOutcome::Assigned(winner),
                    history,
                })
            }
        }
    }

    /// One-shot re-dispatch of every PENDING ticket without a technician.
    /// Failures are logged per ticket and do not stop the sweep.
    pub async fn redispatch_unassigned(&self, rule: &AssignmentRule) -> Result<SweepSummary> {
        let pending = self.tickets.list_unassigned_pending().await?;
        let mut summary = SweepSummary {
            attempted: pending.len(),
            ..Default::default()
        };

        for ticket in pending {
            match self.dispatch(ticket.id, rule).await {
                Ok(report) if report.assigned() => summary.assigned += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Re-dispatch of ticket {} failed: {:?}", ticket.id, e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Re-dispatch sweep: {} attempted, {} assigned, {} failed",
            summary.attempted,
            summary.assigned,
            summary.failed
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::models::UrgencyLevel;
    use crate::shared::geo::{GeoPoint, METERS_PER_DEGREE};
    use crate::shared::test_helpers::TestEngine;
    use tokio_test::{assert_err, assert_ok};

    fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
        GeoPoint::new(origin.lat + km * 1000.0 / METERS_PER_DEGREE, origin.lon)
    }

    #[tokio::test]
    async fn test_picks_near_technician_over_idle_far_one() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let site = GeoPoint::new(14.0700, 100.6000);

        let near = engine.add_technician_at(north_of(site, 0.5)).await;
        let far = engine.add_technician_at(north_of(site, 8.0)).await;
        let existing = engine.insert_ticket(creator, category, UrgencyLevel::Low, None).await;
        engine.store.force_assign(existing.id, near, TicketStatus::InProgress);

        let ticket = engine
            .insert_ticket(creator, category, UrgencyLevel::High, Some(site))
            .await;
        let rule = engine.rule().await;

        let report = assert_ok!(engine.dispatcher().dispatch(ticket.id, &rule).await);
        assert!(report.assigned());
        assert_eq!(report.ticket.assigned_to, Some(near));
        assert_eq!(report.ticket.status, TicketStatus::Pending);
        match &report.outcome {
            DispatchOutcome::Assigned(w) => assert!((w.score - 0.92).abs() < 1e-9),
            other => panic!("expected assignment, got {:?}", other),
        }
        assert_ne!(report.ticket.assigned_to, Some(far));

        // history: auto actor, rationale mentions distance and workload
        assert!(report.history.is_automatic());
        assert_eq!(report.history.old_status, Some(TicketStatus::Pending));
        assert!(report.history.comment.contains("0.5km"));
        assert!(report.history.comment.contains("open tickets: 1"));

        let sent = engine.notifier.sent_to(near);
        assert_eq!(sent, vec![NotificationKind::Assigned]);
    }

    #[tokio::test]
    async fn test_no_technicians_records_single_history_row() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await;
        let before = engine.history(ticket.id).await.len();
        let rule = engine.rule().await;

        let report = assert_ok!(engine.dispatcher().dispatch(ticket.id, &rule).await);
        assert!(!report.assigned());
        assert_eq!(report.ticket.assigned_to, None);
        assert_eq!(report.ticket.priority_score, 3.0);

        let history = engine.history(ticket.id).await;
        assert_eq!(history.len(), before + 1);
        let last = history.last().unwrap();
        assert!(last.comment.starts_with("no technician available"));
        assert_eq!(last.old_status, None);
        assert_eq!(last.new_status, TicketStatus::Pending);
        assert!(engine.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_priority_is_persisted_even_when_unassigned() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("ไฟฟ้า");
        let creator = engine.add_user();
        let tech = engine.add_technician();
        engine.presence().toggle_availability(tech).await.unwrap();

        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Critical, None).await;
        assert_eq!(ticket.priority_score, 0.0);
        let rule = engine.rule().await;

        engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();
        let stored = engine.ticket(ticket.id).await;
        assert_eq!(stored.priority_score, 6.5);
        assert_eq!(stored.assigned_to, None);
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("ประปา");
        let creator = engine.add_user();
        let techs = [engine.add_technician(), engine.add_technician()];
        let rule = engine.rule().await;

        let mut assigned = 0;
        for _ in 0..(rule.max_open_tickets as usize * 2 + 3) {
            let t = engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await;
            if engine.dispatcher().dispatch(t.id, &rule).await.unwrap().assigned() {
                assigned += 1;
            }
        }

        assert_eq!(assigned, rule.max_open_tickets as usize * 2);
        for tech in techs {
            let open = engine.tickets().count_open_assigned(tech, None).await.unwrap();
            assert!(open <= rule.max_open_tickets as i64);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch_respects_capacity() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("ประปา");
        let creator = engine.add_user();
        let techs = [
            engine.add_technician(),
            engine.add_technician(),
            engine.add_technician(),
        ];
        let rule = AssignmentRule {
            max_open_tickets: 1,
            ..engine.rule().await
        };

        let mut ids = Vec::new();
        for _ in 0..30 {
            ids.push(engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await.id);
        }

        let dispatcher = Arc::new(engine.dispatcher());
        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let dispatcher = Arc::clone(&dispatcher);
                let rule = rule.clone();
                tokio::spawn(async move { dispatcher.dispatch(id, &rule).await })
            })
            .collect();

        let mut assigned = 0;
        for handle in handles {
            // a lost race either retries into "no capacity" or surfaces as retryable
            match handle.await.unwrap() {
                Ok(report) if report.assigned() => assigned += 1,
                Ok(report) => assert!(report.ticket.priority_score > 0.0),
                Err(e) => assert!(e.is_retryable()),
            }
        }

        let mut open_total = 0;
        for tech in techs {
            let open = engine.tickets().count_open_assigned(tech, None).await.unwrap();
            assert!(open <= 1, "technician {} holds {} open tickets", tech, open);
            open_total += open;
        }
        assert!(assigned >= 1);
        assert_eq!(open_total, assigned);
    }

    #[tokio::test]
    async fn test_capacity_lost_before_commit_retries_into_unassigned() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let tech = engine.add_technician();
        let rule = AssignmentRule {
            max_open_tickets: 1,
            ..engine.rule().await
        };
        let other = engine.insert_ticket(creator, category, UrgencyLevel::Low, None).await;
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await;

        // the technician is picked, then filled by `other` before the commit lands
        engine.store.fill_before_next_guard(other.id);
        let report = assert_ok!(engine.dispatcher().dispatch(ticket.id, &rule).await);

        assert!(matches!(report.outcome, DispatchOutcome::Unassigned { .. }));
        let stored = engine.ticket(ticket.id).await;
        assert_eq!(stored.assigned_to, None);
        assert_eq!(stored.priority_score, 3.0);
        assert_eq!(engine.ticket(other.id).await.assigned_to, Some(tech));

        // only the creation row and the "no technician" row
        let history = engine.history(ticket.id).await;
        assert_eq!(history.len(), 2);
        assert!(history[1].comment.starts_with("no technician available"));
        assert!(engine.notifier.sent_to(tech).is_empty());
    }

    #[tokio::test]
    async fn test_redispatch_supersedes_previous_assignment() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let first = engine.add_technician();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await;
        let rule = engine.rule().await;

        let report = engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();
        assert_eq!(report.ticket.assigned_to, Some(first));

        // the assignee goes off shift and the ticket is dispatched again
        engine.presence().toggle_availability(first).await.unwrap();
        let report = engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();
        assert!(!report.assigned());
        assert_eq!(report.ticket.assigned_to, None);
        assert_eq!(engine.tickets().count_open_assigned(first, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_requires_pending() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let tech = engine.add_technician();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Medium, None).await;
        engine.store.force_assign(ticket.id, tech, TicketStatus::Working);
        let rule = engine.rule().await;

        let err = assert_err!(engine.dispatcher().dispatch(ticket.id, &rule).await);
        assert!(matches!(err, AppError::InvalidTransition { from: TicketStatus::Working, .. }));
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let engine = TestEngine::new();
        let rule = engine.rule().await;
        let err = assert_err!(engine.dispatcher().dispatch(Uuid::new_v4(), &rule).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_ticket_untouched() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        engine.add_technician();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::High, None).await;
        let history_before = engine.history(ticket.id).await;
        let rule = engine.rule().await;

        engine.store.fail_next_change();
        let err = assert_err!(engine.dispatcher().dispatch(ticket.id, &rule).await);
        assert!(matches!(err, AppError::Database(_)));

        let stored = engine.ticket(ticket.id).await;
        assert_eq!(stored.assigned_to, None);
        assert_eq!(stored.priority_score, 0.0);
        assert_eq!(engine.history(ticket.id).await, history_before);
        assert!(engine.notifier.sent().is_empty());

        // a retry succeeds
        let report = engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();
        assert!(report.assigned());
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_assignment() {
        let engine = TestEngine::with_failing_notifier();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let tech = engine.add_technician();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::Low, None).await;
        let rule = engine.rule().await;

        let report = assert_ok!(engine.dispatcher().dispatch(ticket.id, &rule).await);
        assert!(report.assigned());
        assert_eq!(engine.ticket(ticket.id).await.assigned_to, Some(tech));
    }

    #[tokio::test]
    async fn test_redispatch_sweep() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("Landscaping");
        let creator = engine.add_user();
        let rule = engine.rule().await;
        for _ in 0..3 {
            let t = engine.insert_ticket(creator, category, UrgencyLevel::Low, None).await;
            engine.dispatcher().dispatch(t.id, &rule).await.unwrap();
        }

        engine.add_technician();
        let summary = engine.dispatcher().redispatch_unassigned(&rule).await.unwrap();
        assert_eq!(
            summary,
            SweepSummary {
                attempted: 3,
                assigned: 3,
                failed: 0
            }
        );
        assert!(engine.tickets().list_unassigned_pending().await.unwrap().is_empty());
    }
}
