//! In-memory storage backend
//!
//! Implements every repository trait over one mutex-guarded state, so each
//! operation (in particular `apply_change`) is atomic. Used by the test-suite
//! and for embedded runs without PostgreSQL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::dispatch::models::{AssignmentRule, CreateAssignmentRule};
use crate::features::dispatch::repository::AssignmentRuleRepository;
use crate::features::feedback::models::{CreateFeedback, TicketFeedback};
use crate::features::feedback::repository::FeedbackRepository;
use crate::features::photos::models::{CreatePhoto, Photo, PhotoKind};
use crate::features::photos::repository::PhotoStore;
use crate::features::technicians::models::{Technician, TechnicianPresence};
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::features::tickets::models::{
    CreateTicket, NewStatusHistory, Ticket, TicketChange, TicketStatus, TicketStatusHistory,
};
use crate::features::tickets::repository::TicketRepository;
use crate::shared::geo::GeoPoint;
use crate::shared::types::UserRole;

#[derive(Debug, Default)]
struct State {
    categories: HashMap<Uuid, String>,
    accounts: HashMap<Uuid, Technician>,
    tickets: HashMap<Uuid, Ticket>,
    /// Every history row in commit order
    history: Vec<TicketStatusHistory>,
    presence: HashMap<Uuid, TechnicianPresence>,
    rules: Vec<AssignmentRule>,
    photos: Vec<Photo>,
    feedback: HashMap<Uuid, TicketFeedback>,
    #[cfg(test)]
    fail_next_change: bool,
    #[cfg(test)]
    fill_before_next_guard: Option<Uuid>,
}

impl State {
    fn open_assigned(&self, technician_id: Uuid, exclude_ticket: Option<Uuid>) -> i64 {
        self.tickets
            .values()
            .filter(|t| t.assigned_to == Some(technician_id))
            .filter(|t| Some(t.id) != exclude_ticket)
            .filter(|t| t.status.is_open())
            .count() as i64
    }

    fn ensure_presence(&mut self, technician_id: Uuid, now: DateTime<Utc>) -> &mut TechnicianPresence {
        self.presence
            .entry(technician_id)
            .or_insert_with(|| TechnicianPresence::initial(technician_id, now))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // mutations are computed before any write, so poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state().categories.insert(id, name.to_string());
        id
    }

    pub fn add_account(&self, username: &str, role: UserRole, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.state().accounts.insert(
            id,
            Technician {
                id,
                username: username.to_string(),
                display_name: None,
                role,
                is_active,
            },
        );
        id
    }

    pub fn set_display_name(&self, account_id: Uuid, display_name: &str) {
        if let Some(account) = self.state().accounts.get_mut(&account_id) {
            account.display_name = Some(display_name.to_string());
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Shift a ticket's creation time into the past
    pub fn backdate_ticket(&self, ticket_id: Uuid, by: chrono::Duration) {
        if let Some(ticket) = self.state().tickets.get_mut(&ticket_id) {
            ticket.created_at -= by;
        }
    }

    /// Put a ticket into a state directly, bypassing the workflow and history
    pub fn force_assign(&self, ticket_id: Uuid, technician_id: Uuid, status: TicketStatus) {
        if let Some(ticket) = self.state().tickets.get_mut(&ticket_id) {
            ticket.assigned_to = Some(technician_id);
            ticket.status = status;
            ticket.completed_at = if status.is_finished() {
                Some(Utc::now())
            } else {
                None
            };
        }
    }

    /// Make the next `apply_change` fail as a storage error
    pub fn fail_next_change(&self) {
        self.state().fail_next_change = true;
    }

    /// On the next guarded commit, hand `filler` to the guarded technician
    /// just before the capacity re-check, as a concurrent dispatch would
    pub fn fill_before_next_guard(&self, filler: Uuid) {
        self.state().fill_before_next_guard = Some(filler);
    }

    pub fn active_rule_count(&self) -> usize {
        self.state().rules.iter().filter(|r| r.is_active).count()
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert(
        &self,
        data: &CreateTicket,
        history: NewStatusHistory,
    ) -> Result<(Ticket, TicketStatusHistory)> {
        let mut state = self.state();

        let category_name = state
            .categories
            .get(&data.category_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", data.category_id)))?;

        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: data.title.clone(),
            description: data.description.clone(),
            category_id: data.category_id,
            category_name,
            created_by: data.created_by,
            assigned_to: None,
            location: data.location,
            address_description: data.address_description.clone(),
            urgency_level: data.urgency_level.clone(),
            priority_score: 0.0,
            status: history.new_status,
            reject_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        let entry = history.into_entry(ticket.id, now);

        state.tickets.insert(ticket.id, ticket.clone());
        state.history.push(entry.clone());

        Ok((ticket, entry))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.state().tickets.get(&id).cloned())
    }

    async fn apply_change(&self, change: TicketChange) -> Result<(Ticket, TicketStatusHistory)> {
        let mut state = self.state();

        #[cfg(test)]
        if std::mem::take(&mut state.fail_next_change) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let current = state
            .tickets
            .get(&change.ticket_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", change.ticket_id)))?;

        if current.version() != change.expected {
            return Err(AppError::Conflict(format!(
                "Ticket '{}' changed concurrently",
                change.ticket_id
            )));
        }

        if let Some(guard) = change.capacity_guard {
            #[cfg(test)]
            if let Some(filler) = state.fill_before_next_guard.take() {
                if let Some(ticket) = state.tickets.get_mut(&filler) {
                    ticket.assigned_to = Some(guard.technician_id);
                }
            }

            let open = state.open_assigned(guard.technician_id, Some(change.ticket_id));
            if open >= guard.max_open_tickets as i64 {
                return Err(AppError::CapacityExceeded {
                    technician_id: guard.technician_id,
                });
            }
        }

        let category_name = match &change.details {
            Some(details) => Some(
                state
                    .categories
                    .get(&details.category_id)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Category '{}' not found", details.category_id))
                    })?,
            ),
            None => None,
        };

        let now = Utc::now();
        let mut ticket = current;
        if let (Some(details), Some(category_name)) = (change.details, category_name) {
            ticket.title = details.title;
            ticket.description = details.description;
            ticket.category_id = details.category_id;
            ticket.category_name = category_name;
            ticket.address_description = details.address_description;
            ticket.urgency_level = details.urgency_level;
        }
        ticket.status = change.status;
        ticket.assigned_to = change.assigned_to;
        ticket.priority_score = change.priority_score;
        ticket.reject_reason = change.reject_reason;
        ticket.completed_at = change.completed_at;
        ticket.updated_at = now;
        let entry = change.history.into_entry(ticket.id, now);

        state.tickets.insert(ticket.id, ticket.clone());
        state.history.push(entry.clone());

        Ok((ticket, entry))
    }

    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketStatusHistory>> {
        Ok(self
            .state()
            .history
            .iter()
            .filter(|h| h.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn count_open_assigned(
        &self,
        technician_id: Uuid,
        exclude_ticket: Option<Uuid>,
    ) -> Result<i64> {
        Ok(self.state().open_assigned(technician_id, exclude_ticket))
    }

    async fn count_nearby_since(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        since: DateTime<Utc>,
        exclude_ticket: Uuid,
    ) -> Result<i64> {
        let bbox = center.bounding_box(radius_meters);
        let count = self
            .state()
            .tickets
            .values()
            .filter(|t| t.id != exclude_ticket && t.created_at >= since)
            .filter_map(|t| t.location)
            .filter(|p| bbox.contains(p) && p.distance_meters(&center) <= radius_meters)
            .count();
        Ok(count as i64)
    }

    async fn list_assigned_active(&self, technician_id: Uuid) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .state()
            .tickets
            .values()
            .filter(|t| t.assigned_to == Some(technician_id) && !t.status.is_terminal())
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn list_unassigned_pending(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .state()
            .tickets
            .values()
            .filter(|t| t.status == TicketStatus::Pending && t.assigned_to.is_none())
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tickets)
    }
}

#[async_trait]
impl TechnicianRoster for MemoryStore {
    async fn list_technicians(&self) -> Result<Vec<Technician>> {
        Ok(self
            .state()
            .accounts
            .values()
            .filter(|a| a.role == UserRole::Technician)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>> {
        Ok(self
            .state()
            .accounts
            .get(&id)
            .filter(|a| a.role == UserRole::Technician)
            .cloned())
    }
}

#[async_trait]
impl PresenceRepository for MemoryStore {
    async fn find(&self, technician_id: Uuid) -> Result<Option<TechnicianPresence>> {
        Ok(self.state().presence.get(&technician_id).cloned())
    }

    async fn toggle_availability(&self, technician_id: Uuid) -> Result<TechnicianPresence> {
        let now = Utc::now();
        let mut state = self.state();
        let presence = state.ensure_presence(technician_id, now);
        presence.is_available = !presence.is_available;
        presence.updated_at = now;
        Ok(presence.clone())
    }

    async fn set_location(
        &self,
        technician_id: Uuid,
        location: Option<GeoPoint>,
    ) -> Result<TechnicianPresence> {
        let now = Utc::now();
        let mut state = self.state();
        let presence = state.ensure_presence(technician_id, now);
        presence.location = location;
        presence.updated_at = now;
        Ok(presence.clone())
    }
}

#[async_trait]
impl AssignmentRuleRepository for MemoryStore {
    async fn find_active(&self) -> Result<Option<AssignmentRule>> {
        Ok(self.state().rules.iter().find(|r| r.is_active).cloned())
    }

    async fn ensure_default(&self) -> Result<AssignmentRule> {
        let mut state = self.state();
        if let Some(rule) = state.rules.iter().find(|r| r.is_active) {
            return Ok(rule.clone());
        }
        let rule = AssignmentRule::default_rule(Utc::now());
        state.rules.push(rule.clone());
        Ok(rule)
    }

    async fn replace_active(&self, values: &CreateAssignmentRule) -> Result<AssignmentRule> {
        let mut state = self.state();
        for rule in state.rules.iter_mut() {
            rule.is_active = false;
        }
        let rule = AssignmentRule::from_values(values, Utc::now());
        state.rules.push(rule.clone());
        Ok(rule)
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn attach_photo(&self, photo: &CreatePhoto) -> Result<Photo> {
        let mut state = self.state();
        if !state.tickets.contains_key(&photo.ticket_id) {
            return Err(AppError::NotFound(format!("Ticket '{}' not found", photo.ticket_id)));
        }
        let photo = Photo {
            id: Uuid::new_v4(),
            ticket_id: photo.ticket_id,
            kind: photo.kind,
            storage_path: photo.storage_path.clone(),
            uploaded_by: photo.uploaded_by,
            created_at: Utc::now(),
        };
        state.photos.push(photo.clone());
        Ok(photo)
    }

    async fn has_after_photo(&self, ticket_id: Uuid) -> Result<bool> {
        Ok(self
            .state()
            .photos
            .iter()
            .any(|p| p.ticket_id == ticket_id && p.kind == PhotoKind::After))
    }
}

#[async_trait]
impl FeedbackRepository for MemoryStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketFeedback>> {
        Ok(self.state().feedback.get(&ticket_id).cloned())
    }

    async fn insert(&self, data: &CreateFeedback) -> Result<TicketFeedback> {
        let mut state = self.state();
        if state.feedback.contains_key(&data.ticket_id) {
            return Err(AppError::Conflict(format!(
                "Feedback for ticket '{}' already submitted",
                data.ticket_id
            )));
        }
        let feedback = TicketFeedback {
            id: Uuid::new_v4(),
            ticket_id: data.ticket_id,
            created_by: data.created_by,
            technician_id: data.technician_id,
            overall_rating: data.overall_rating,
            response_speed_rating: data.response_speed_rating,
            work_quality_rating: data.work_quality_rating,
            politeness_rating: data.politeness_rating,
            cleanliness_rating: data.cleanliness_rating,
            comment: data.comment.clone(),
            created_at: Utc::now(),
        };
        state.feedback.insert(data.ticket_id, feedback.clone());
        Ok(feedback)
    }
}
