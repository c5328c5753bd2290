use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::tickets::models::{
    CreateTicket, NewStatusHistory, Ticket, TicketChange, TicketStatusHistory,
};
use crate::shared::geo::GeoPoint;

/// Persistence for tickets and their status history.
///
/// Status and assignment only change through [`TicketRepository::apply_change`],
/// which writes the ticket and its history row as one unit.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket together with its creation history row
    async fn insert(
        &self,
        data: &CreateTicket,
        history: NewStatusHistory,
    ) -> Result<(Ticket, TicketStatusHistory)>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Atomically compare `change.expected` against the stored ticket, re-check
    /// the capacity guard if present, then write the ticket fields and append
    /// the history row. Nothing is written on any error.
    async fn apply_change(&self, change: TicketChange) -> Result<(Ticket, TicketStatusHistory)>;

    /// History of one ticket, oldest first
    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketStatusHistory>>;

    /// Tickets assigned to the technician whose status still counts as open
    async fn count_open_assigned(
        &self,
        technician_id: Uuid,
        exclude_ticket: Option<Uuid>,
    ) -> Result<i64>;

    /// Tickets other than `exclude_ticket` created at or after `since` within
    /// `radius_meters` of `center`
    async fn count_nearby_since(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        since: DateTime<Utc>,
        exclude_ticket: Uuid,
    ) -> Result<i64>;

    /// A technician's job list: everything assigned except CLOSED and REJECTED, newest first
    async fn list_assigned_active(&self, technician_id: Uuid) -> Result<Vec<Ticket>>;

    /// PENDING tickets with nobody assigned, oldest first
    async fn list_unassigned_pending(&self) -> Result<Vec<Ticket>>;
}
