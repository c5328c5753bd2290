use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::dispatch::{AssignmentRuleService, DispatchReport, Dispatcher};
use crate::features::notifications::{deliver, NotificationKind, NotificationPayload, Notifier};
use crate::features::photos::PhotoStore;
use crate::features::technicians::TechnicianRoster;
use crate::features::tickets::models::{
    CapacityGuard, NewStatusHistory, Ticket, TicketChange, TicketStatus, TicketStatusHistory,
};
use crate::features::tickets::repository::TicketRepository;
use crate::shared::types::{Actor, UserRole};

/// Which row of the transition table a request matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Assigned technician takes the job (PENDING -> IN_PROGRESS)
    Accept,
    /// Assigned technician hands the job back (PENDING -> PENDING)
    Decline,
    /// Assigned technician moves active work along
    Progress,
    /// Assigned technician finishes (active -> COMPLETED)
    Complete,
    /// Creator withdraws an unfinished ticket (-> REJECTED)
    Cancel,
    /// Administrator sets any status, including the current one
    AdminSet,
}

/// Match a request against the transition table without touching storage
pub fn classify(ticket: &Ticket, to: TicketStatus, actor: &Actor) -> Result<Transition> {
    let from = ticket.status;
    let illegal = || AppError::InvalidTransition { from, to };

    match actor.role {
        UserRole::Admin => {
            if to == TicketStatus::Closed
                && !matches!(from, TicketStatus::Completed | TicketStatus::Closed)
            {
                return Err(illegal());
            }
            Ok(Transition::AdminSet)
        }
        UserRole::Technician => {
            if ticket.assigned_to != Some(actor.user_id) {
                return Err(AppError::Forbidden(format!(
                    "Ticket '{}' is not assigned to you",
                    ticket.id
                )));
            }
            match (from, to) {
                (TicketStatus::Pending, TicketStatus::InProgress) => Ok(Transition::Accept),
                (TicketStatus::Pending, TicketStatus::Pending) => Ok(Transition::Decline),
                (f, TicketStatus::Completed) if f.is_active_work() => Ok(Transition::Complete),
                (f, TicketStatus::Inspecting | TicketStatus::Working) if f.is_active_work() => {
                    Ok(Transition::Progress)
                }
                _ => Err(illegal()),
            }
        }
        UserRole::User => {
            if ticket.created_by != actor.user_id {
                return Err(AppError::Forbidden(format!(
                    "Ticket '{}' was not created by you",
                    ticket.id
                )));
            }
            if to == TicketStatus::Rejected && from.is_open() {
                Ok(Transition::Cancel)
            } else {
                Err(illegal())
            }
        }
    }
}

/// Result of a committed transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub ticket: Ticket,
    pub history: TicketStatusHistory,
    /// Set when a decline triggered re-dispatch and it committed
    pub redispatch: Option<DispatchReport>,
}

/// The sole mutator of ticket status outside dispatch
pub struct WorkflowService {
    tickets: Arc<dyn TicketRepository>,
    roster: Arc<dyn TechnicianRoster>,
    photos: Arc<dyn PhotoStore>,
    notifier: Arc<dyn Notifier>,
    dispatcher: Arc<Dispatcher>,
    rules: Arc<AssignmentRuleService>,
}

impl WorkflowService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        roster: Arc<dyn TechnicianRoster>,
        photos: Arc<dyn PhotoStore>,
        notifier: Arc<dyn Notifier>,
        dispatcher: Arc<Dispatcher>,
        rules: Arc<AssignmentRuleService>,
    ) -> Self {
        Self {
            tickets,
            roster,
            photos,
            notifier,
            dispatcher,
            rules,
        }
    }

    /// Move a ticket to `to` on behalf of `actor`.
    ///
    /// Illegal requests and missing artifacts are refused before anything is
    /// written. Every accepted request appends exactly one history row.
    pub async fn transition(
        &self,
        ticket_id: Uuid,
        to: TicketStatus,
        actor: Actor,
        comment: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket_id)))?;

        let kind = classify(&ticket, to, &actor)?;

        if kind == Transition::Complete && !self.photos.has_after_photo(ticket.id).await? {
            return Err(AppError::MissingArtifact(format!(
                "Ticket '{}' needs an after photo before it can be completed",
                ticket.id
            )));
        }

        let note = comment.map(str::trim).filter(|c| !c.is_empty());
        let change = self.build_change(&ticket, kind, to, &actor, note).await?;
        let previous = ticket;

        let (ticket, history) = self.tickets.apply_change(change).await?;

        tracing::info!(
            "Ticket {} {} -> {} by {} ({:?})",
            ticket.id,
            previous.status,
            ticket.status,
            actor.user_id,
            kind
        );

        self.notify(&previous, &ticket, kind).await;

        let redispatch = match kind {
            Transition::Decline => self.redispatch(&ticket, actor.user_id).await,
            _ => None,
        };

        Ok(TransitionOutcome {
            ticket,
            history,
            redispatch,
        })
    }

    async fn build_change(
        &self,
        ticket: &Ticket,
        kind: Transition,
        to: TicketStatus,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<TicketChange> {
        let now = Utc::now();
        let with_note = |default: &str| note.map_or_else(|| default.to_string(), str::to_string);

        let comment = match kind {
            Transition::Accept => with_note("technician accepted the job"),
            Transition::Decline => {
                let name = match self.roster.find_by_id(actor.user_id).await? {
                    Some(t) => t.name().to_string(),
                    None => actor.user_id.to_string(),
                };
                match note {
                    Some(n) => format!("technician {} declined the job: {}", name, n),
                    None => format!("technician {} declined the job", name),
                }
            }
            Transition::Progress => with_note(&format!("status updated to {}", to)),
            Transition::Complete => with_note("work completed"),
            Transition::Cancel => format!(
                "cancelled by creator: {}",
                note.unwrap_or("no reason given")
            ),
            Transition::AdminSet => format!(
                "[admin] {}",
                note.unwrap_or("status set by administrator")
            ),
        };

        let history = NewStatusHistory::new(
            Some(ticket.status),
            to,
            Some(actor.user_id),
            comment.clone(),
        );
        let mut change = TicketChange::from_ticket(ticket, history);
        change.status = to;

        match kind {
            Transition::Accept | Transition::Progress => {}
            Transition::Decline => change.assigned_to = None,
            Transition::Complete => change.completed_at = Some(now),
            Transition::Cancel => {
                change.assigned_to = None;
                change.reject_reason = Some(comment);
                change.completed_at = None;
            }
            Transition::AdminSet => {
                change.completed_at = if to.is_finished() {
                    ticket.completed_at.or(Some(now))
                } else {
                    None
                };

                // reopening puts the ticket back on the assignee's open count
                if let Some(technician_id) = ticket.assigned_to {
                    if to.is_open() && !ticket.status.is_open() {
                        let rule = self.rules.active_rule().await?;
                        change.capacity_guard = Some(CapacityGuard {
                            technician_id,
                            max_open_tickets: rule.max_open_tickets,
                        });
                    }
                }
            }
        }

        Ok(change)
    }

    async fn notify(&self, previous: &Ticket, ticket: &Ticket, kind: Transition) {
        let (user_id, kind, message) = match kind {
            Transition::Accept => (
                ticket.created_by,
                NotificationKind::StatusChange,
                format!("A technician accepted your ticket: {}", ticket.title),
            ),
            Transition::Decline => (
                ticket.created_by,
                NotificationKind::Reassigned,
                format!(
                    "The technician declined your ticket, looking for another: {}",
                    ticket.title
                ),
            ),
            Transition::Progress | Transition::AdminSet => (
                ticket.created_by,
                NotificationKind::StatusChange,
                format!("Your ticket is now {}: {}", ticket.status, ticket.title),
            ),
            Transition::Complete => (
                ticket.created_by,
                NotificationKind::Completed,
                format!("Work on your ticket is complete: {}", ticket.title),
            ),
            Transition::Cancel => match previous.assigned_to {
                Some(technician) => (
                    technician,
                    NotificationKind::StatusChange,
                    format!("The creator cancelled this ticket: {}", ticket.title),
                ),
                None => return,
            },
        };

        deliver(
            &self.notifier,
            user_id,
            kind,
            NotificationPayload::new(ticket.id, format!("Ticket {}", ticket.status), message),
        )
        .await;
    }

    /// Re-dispatch after a decline. The decline is already committed, so a
    /// failure here is logged and the ticket stays unassigned for the next sweep.
    async fn redispatch(&self, ticket: &Ticket, declined_by: Uuid) -> Option<DispatchReport> {
        let result = match self.rules.active_rule().await {
            Ok(rule) => {
                self.dispatcher
                    .redispatch_after_decline(ticket.id, &rule, declined_by)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                if !report.assigned() {
                    deliver(
                        &self.notifier,
                        ticket.created_by,
                        NotificationKind::StatusChange,
                        NotificationPayload::new(
                            ticket.id,
                            "No technician available",
                            format!("No technician is available right now for: {}", ticket.title),
                        ),
                    )
                    .await;
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!("Failed to re-dispatch ticket {}: {:?}", ticket.id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DispatchConfig;
    use crate::features::dispatch::dtos::UpdateAssignmentRuleDto;
    use crate::features::photos::{CreatePhoto, PhotoKind};
    use crate::features::tickets::models::UrgencyLevel;
    use crate::shared::geo::GeoPoint;
    use crate::shared::test_helpers::TestEngine;
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        engine: TestEngine,
        creator: Uuid,
        ticket: Ticket,
    }

    /// A dispatched ticket with one technician on the roster
    async fn dispatched() -> (Fixture, Uuid) {
        dispatched_on(TestEngine::new()).await
    }

    async fn dispatched_on(engine: TestEngine) -> (Fixture, Uuid) {
        let category = engine.store.add_category("ไฟฟ้า");
        let creator = engine.add_user();
        let tech = engine.add_technician();
        let ticket = engine.insert_ticket(creator, category, UrgencyLevel::High, None).await;
        let rule = engine.rule().await;
        let report = engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();
        assert_eq!(report.ticket.assigned_to, Some(tech));
        (
            Fixture {
                engine,
                creator,
                ticket: report.ticket,
            },
            tech,
        )
    }

    async fn attach_after_photo(engine: &TestEngine, ticket_id: Uuid, by: Uuid) {
        engine
            .photos()
            .attach_photo(&CreatePhoto {
                ticket_id,
                kind: PhotoKind::After,
                storage_path: format!("tickets/{}/after.jpg", ticket_id),
                uploaded_by: by,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_classify_table() {
        let tech = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let admin = Actor::admin(Uuid::new_v4());
        let mut ticket = Ticket {
            id: Uuid::new_v4(),
            title: "Leaking pipe".into(),
            description: String::new(),
            category_id: Uuid::new_v4(),
            category_name: "ประปา".into(),
            created_by: creator,
            assigned_to: Some(tech),
            location: None,
            address_description: String::new(),
            urgency_level: UrgencyLevel::Medium,
            priority_score: 0.0,
            status: TicketStatus::Pending,
            reject_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };
        let t = Actor::technician(tech);
        let c = Actor::user(creator);

        assert_eq!(classify(&ticket, TicketStatus::InProgress, &t).unwrap(), Transition::Accept);
        assert_eq!(classify(&ticket, TicketStatus::Pending, &t).unwrap(), Transition::Decline);
        assert!(classify(&ticket, TicketStatus::Completed, &t).is_err());
        assert_eq!(classify(&ticket, TicketStatus::Rejected, &c).unwrap(), Transition::Cancel);
        assert!(classify(&ticket, TicketStatus::Closed, &admin).is_err());
        assert_eq!(classify(&ticket, TicketStatus::Pending, &admin).unwrap(), Transition::AdminSet);

        ticket.status = TicketStatus::Working;
        assert_eq!(classify(&ticket, TicketStatus::Inspecting, &t).unwrap(), Transition::Progress);
        assert_eq!(classify(&ticket, TicketStatus::Completed, &t).unwrap(), Transition::Complete);
        assert!(classify(&ticket, TicketStatus::InProgress, &t).is_err());
        assert!(classify(&ticket, TicketStatus::Pending, &t).is_err());

        ticket.status = TicketStatus::Completed;
        assert_eq!(classify(&ticket, TicketStatus::Closed, &admin).unwrap(), Transition::AdminSet);
        assert!(classify(&ticket, TicketStatus::Rejected, &c).is_err());

        let stranger = Actor::technician(Uuid::new_v4());
        assert!(matches!(
            classify(&ticket, TicketStatus::Working, &stranger),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_full_lifecycle_to_closed() {
        let (f, tech) = dispatched().await;
        let workflow = f.engine.workflow();
        let t = Actor::technician(tech);

        let accepted = assert_ok!(workflow.transition(f.ticket.id, TicketStatus::InProgress, t, None).await);
        assert_eq!(accepted.history.old_status, Some(TicketStatus::Pending));
        assert_eq!(accepted.history.changed_by, Some(tech));

        workflow.transition(f.ticket.id, TicketStatus::Inspecting, t, Some("checking wiring")).await.unwrap();
        workflow.transition(f.ticket.id, TicketStatus::Working, t, None).await.unwrap();

        attach_after_photo(&f.engine, f.ticket.id, tech).await;
        let done = workflow.transition(f.ticket.id, TicketStatus::Completed, t, None).await.unwrap();
        assert_eq!(done.ticket.status, TicketStatus::Completed);
        assert!(done.ticket.completed_at.is_some());
        assert_eq!(f.engine.tickets().count_open_assigned(tech, None).await.unwrap(), 0);

        let closed = workflow
            .transition(f.ticket.id, TicketStatus::Closed, Actor::admin(Uuid::new_v4()), None)
            .await
            .unwrap();
        assert_eq!(closed.ticket.status, TicketStatus::Closed);
        assert_eq!(closed.ticket.completed_at, done.ticket.completed_at);

        // creation + dispatch + 5 transitions, oldest first, chained statuses
        let history = f.engine.history(f.ticket.id).await;
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].old_status, None);
        for pair in history.windows(2) {
            assert!(pair[0].changed_at <= pair[1].changed_at);
        }
        assert_eq!(history[6].comment, "[admin] status set by administrator");

        let kinds = f.engine.notifier.sent_to(f.creator);
        assert_eq!(
            kinds,
            vec![
                NotificationKind::StatusChange,
                NotificationKind::StatusChange,
                NotificationKind::StatusChange,
                NotificationKind::Completed,
                NotificationKind::StatusChange,
            ]
        );
    }

    #[tokio::test]
    async fn test_complete_requires_after_photo() {
        let (f, tech) = dispatched().await;
        let workflow = f.engine.workflow();
        let t = Actor::technician(tech);
        workflow.transition(f.ticket.id, TicketStatus::InProgress, t, None).await.unwrap();
        let before = f.engine.history(f.ticket.id).await.len();

        let err = assert_err!(workflow.transition(f.ticket.id, TicketStatus::Completed, t, None).await);
        assert!(matches!(err, AppError::MissingArtifact(_)));

        let stored = f.engine.ticket(f.ticket.id).await;
        assert_eq!(stored.status, TicketStatus::InProgress);
        assert_eq!(stored.completed_at, None);
        assert_eq!(f.engine.history(f.ticket.id).await.len(), before);
    }

    #[tokio::test]
    async fn test_admin_cannot_close_pending() {
        let (f, _) = dispatched().await;
        let before = f.engine.history(f.ticket.id).await;

        let err = assert_err!(
            f.engine
                .workflow()
                .transition(f.ticket.id, TicketStatus::Closed, Actor::admin(Uuid::new_v4()), None)
                .await
        );
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: TicketStatus::Pending,
                to: TicketStatus::Closed
            }
        ));
        assert_eq!(f.engine.ticket(f.ticket.id).await.status, TicketStatus::Pending);
        assert_eq!(f.engine.history(f.ticket.id).await, before);
    }

    #[tokio::test]
    async fn test_admin_noop_still_records_history() {
        let (f, _) = dispatched().await;
        let before = f.engine.history(f.ticket.id).await.len();
        let admin = Uuid::new_v4();

        let outcome = f
            .engine
            .workflow()
            .transition(f.ticket.id, TicketStatus::Pending, Actor::admin(admin), Some("re-checked"))
            .await
            .unwrap();

        assert_eq!(outcome.history.old_status, Some(TicketStatus::Pending));
        assert_eq!(outcome.history.new_status, TicketStatus::Pending);
        assert_eq!(outcome.history.changed_by, Some(admin));
        assert_eq!(outcome.history.comment, "[admin] re-checked");
        assert_eq!(f.engine.history(f.ticket.id).await.len(), before + 1);
    }

    #[tokio::test]
    async fn test_admin_force_keeps_completed_at_consistent() {
        let (f, tech) = dispatched().await;
        let admin = Actor::admin(Uuid::new_v4());
        let workflow = f.engine.workflow();

        let done = workflow.transition(f.ticket.id, TicketStatus::Completed, admin, None).await.unwrap();
        assert!(done.ticket.completed_at.is_some());

        let reopened = workflow.transition(f.ticket.id, TicketStatus::Working, admin, None).await.unwrap();
        assert_eq!(reopened.ticket.completed_at, None);
        assert_eq!(reopened.ticket.assigned_to, Some(tech));
    }

    #[tokio::test]
    async fn test_admin_reopen_respects_capacity() {
        let (f, tech) = dispatched().await;
        let admin = Actor::admin(Uuid::new_v4());
        let workflow = f.engine.workflow();
        workflow.transition(f.ticket.id, TicketStatus::Completed, admin, None).await.unwrap();

        let rule = f.engine.rule().await;
        AssignmentRuleService::new(f.engine.rules())
            .update_rule(UpdateAssignmentRuleDto {
                max_open_tickets: 1,
                weight_distance: rule.weight_distance,
                weight_workload: rule.weight_workload,
            })
            .await
            .unwrap();

        // the freed slot goes to a new ticket
        let category = f.engine.store.add_category("ประปา");
        let next = f.engine.insert_ticket(f.creator, category, UrgencyLevel::Medium, None).await;
        let rule = f.engine.rule().await;
        let report = f.engine.dispatcher().dispatch(next.id, &rule).await.unwrap();
        assert_eq!(report.ticket.assigned_to, Some(tech));

        let before = f.engine.history(f.ticket.id).await.len();
        let err = assert_err!(
            workflow.transition(f.ticket.id, TicketStatus::Working, admin, None).await
        );
        assert!(matches!(err, AppError::CapacityExceeded { technician_id } if technician_id == tech));
        assert_eq!(f.engine.ticket(f.ticket.id).await.status, TicketStatus::Completed);
        assert_eq!(f.engine.history(f.ticket.id).await.len(), before);

        // moving between finished statuses is not a reopen
        assert_ok!(workflow.transition(f.ticket.id, TicketStatus::Closed, admin, None).await);
    }

    #[tokio::test]
    async fn test_decline_reassigns_to_another_technician() {
        let engine = TestEngine::new();
        let category = engine.store.add_category("ประปา");
        let creator = engine.add_user();
        let site = GeoPoint::new(14.0700, 100.6000);
        let first = engine.add_technician_at(GeoPoint::new(14.1420, 100.6000)).await;
        let ticket = engine
            .insert_ticket(creator, category, UrgencyLevel::Medium, Some(site))
            .await;
        let rule = engine.rule().await;
        engine.dispatcher().dispatch(ticket.id, &rule).await.unwrap();

        // a closer technician comes on shift before the decline
        let second = engine.add_technician_at(GeoPoint::new(14.0745, 100.6000)).await;
        let before = engine.history(ticket.id).await.len();

        let outcome = engine
            .workflow()
            .transition(ticket.id, TicketStatus::Pending, Actor::technician(first), Some("too far"))
            .await
            .unwrap();

        // the committed decline left the ticket unassigned
        assert_eq!(outcome.ticket.assigned_to, None);
        assert!(outcome.history.comment.contains("declined the job: too far"));

        let report = outcome.redispatch.expect("re-dispatch ran");
        assert_eq!(report.ticket.assigned_to, Some(second));

        let stored = engine.ticket(ticket.id).await;
        assert_eq!(stored.assigned_to, Some(second));
        assert_eq!(stored.status, TicketStatus::Pending);
        assert_eq!(engine.tickets().count_open_assigned(first, None).await.unwrap(), 0);
        assert!(engine.history(ticket.id).await.len() >= before + 2);

        assert_eq!(engine.notifier.sent_to(creator), vec![NotificationKind::Reassigned]);
        assert_eq!(engine.notifier.sent_to(second), vec![NotificationKind::Assigned]);
    }

    #[tokio::test]
    async fn test_decline_by_only_technician_hands_ticket_back() {
        let (f, only) = dispatched().await;

        let outcome = f
            .engine
            .workflow()
            .transition(f.ticket.id, TicketStatus::Pending, Actor::technician(only), None)
            .await
            .unwrap();
        assert_eq!(outcome.ticket.assigned_to, None);

        let report = outcome.redispatch.unwrap();
        assert!(report.assigned());
        assert_eq!(f.engine.ticket(f.ticket.id).await.assigned_to, Some(only));
        assert_eq!(
            f.engine.notifier.sent_to(f.creator),
            vec![NotificationKind::Reassigned]
        );
        assert_eq!(
            f.engine.notifier.sent_to(only),
            vec![NotificationKind::Assigned, NotificationKind::Assigned]
        );
    }

    #[tokio::test]
    async fn test_decline_with_exclusion_leaves_ticket_unassigned() {
        let engine = TestEngine::with_dispatch_config(DispatchConfig {
            exclude_decliner: true,
            ..DispatchConfig::default()
        });
        let (f, only) = dispatched_on(engine).await;

        let outcome = f
            .engine
            .workflow()
            .transition(f.ticket.id, TicketStatus::Pending, Actor::technician(only), None)
            .await
            .unwrap();

        let report = outcome.redispatch.unwrap();
        assert!(!report.assigned());
        assert!(report.history.comment.contains("1 declined"));
        assert_eq!(f.engine.ticket(f.ticket.id).await.assigned_to, None);
        assert_eq!(
            f.engine.notifier.sent_to(f.creator),
            vec![NotificationKind::Reassigned, NotificationKind::StatusChange]
        );
    }

    #[tokio::test]
    async fn test_creator_cancel_unassigns_and_notifies_technician() {
        let (f, tech) = dispatched().await;
        let workflow = f.engine.workflow();
        workflow
            .transition(f.ticket.id, TicketStatus::InProgress, Actor::technician(tech), None)
            .await
            .unwrap();

        let outcome = workflow
            .transition(f.ticket.id, TicketStatus::Rejected, Actor::user(f.creator), None)
            .await
            .unwrap();

        assert_eq!(outcome.ticket.status, TicketStatus::Rejected);
        assert_eq!(outcome.ticket.assigned_to, None);
        assert_eq!(
            outcome.ticket.reject_reason.as_deref(),
            Some("cancelled by creator: no reason given")
        );
        let to_tech = f.engine.notifier.sent_to(tech);
        assert_eq!(to_tech.last(), Some(&NotificationKind::StatusChange));

        // terminal: nothing but an administrator moves it now
        let err = assert_err!(
            workflow
                .transition(f.ticket.id, TicketStatus::Rejected, Actor::user(f.creator), None)
                .await
        );
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_only_assignee_may_act() {
        let (f, _) = dispatched().await;
        let other = f.engine.add_technician();

        let err = assert_err!(
            f.engine
                .workflow()
                .transition(f.ticket.id, TicketStatus::InProgress, Actor::technician(other), None)
                .await
        );
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reassigned_technician_loses_access() {
        let (f, tech) = dispatched().await;
        let workflow = f.engine.workflow();

        // the ticket moves to someone else before the technician acts
        let other = f.engine.add_technician();
        f.engine.store.force_assign(f.ticket.id, other, TicketStatus::Pending);

        let err = assert_err!(
            workflow
                .transition(f.ticket.id, TicketStatus::InProgress, Actor::technician(tech), None)
                .await
        );
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
