use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::constants::{OVERDUE_ACTIVE_HOURS, OVERDUE_PENDING_HOURS};
use crate::shared::geo::GeoPoint;

/// Ticket status, stored as its uppercase label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    InProgress,
    Inspecting,
    Working,
    Completed,
    Closed,
    Rejected,
}

impl TicketStatus {
    /// Statuses that no longer count against a technician's capacity
    pub const NOT_OPEN: [TicketStatus; 3] = [
        TicketStatus::Completed,
        TicketStatus::Closed,
        TicketStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "PENDING",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Inspecting => "INSPECTING",
            TicketStatus::Working => "WORKING",
            TicketStatus::Completed => "COMPLETED",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Rejected => "REJECTED",
        }
    }

    /// No transitions are defined out of these (except an administrator force-set)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed | TicketStatus::Rejected)
    }

    /// Counts toward `open_count` when assigned to a technician
    pub fn is_open(&self) -> bool {
        !Self::NOT_OPEN.contains(self)
    }

    /// Accepted and being worked on by the technician
    pub fn is_active_work(&self) -> bool {
        matches!(
            self,
            TicketStatus::InProgress | TicketStatus::Inspecting | TicketStatus::Working
        )
    }

    /// `completed_at` is set exactly when the status is one of these
    pub fn is_finished(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Closed)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TicketStatus::Pending),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "INSPECTING" => Ok(TicketStatus::Inspecting),
            "WORKING" => Ok(TicketStatus::Working),
            "COMPLETED" => Ok(TicketStatus::Completed),
            "CLOSED" => Ok(TicketStatus::Closed),
            "REJECTED" => Ok(TicketStatus::Rejected),
            other => Err(AppError::Validation(format!(
                "Unknown ticket status '{}'",
                other
            ))),
        }
    }
}

/// Reported urgency. Unknown labels read from storage keep their text so the
/// priority scorer can fall back to the default weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
    #[serde(untagged)]
    Other(String),
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &str {
        match self {
            UrgencyLevel::Low => "LOW",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Critical => "CRITICAL",
            UrgencyLevel::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label {
            "LOW" => UrgencyLevel::Low,
            "MEDIUM" => UrgencyLevel::Medium,
            "HIGH" => UrgencyLevel::High,
            "CRITICAL" => UrgencyLevel::Critical,
            other => UrgencyLevel::Other(other.to_string()),
        }
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Medium
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported facility problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub location: Option<GeoPoint>,
    pub address_description: String,
    pub urgency_level: UrgencyLevel,
    pub priority_score: f64,
    pub status: TicketStatus,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// The assignment state a mutation must observe to be committed
    pub fn version(&self) -> TicketVersion {
        TicketVersion {
            status: self.status,
            assigned_to: self.assigned_to,
        }
    }

    /// Pending for more than a day, or accepted but unfinished for more than three
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        let age = now - self.created_at;
        match self.status {
            TicketStatus::Pending => age > Duration::hours(OVERDUE_PENDING_HOURS),
            s if s.is_active_work() => age > Duration::hours(OVERDUE_ACTIVE_HOURS),
            _ => false,
        }
    }
}

/// Row shape of `tickets` joined with `categories.name`
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address_description: String,
    pub urgency_level: String,
    pub priority_score: f64,
    pub status: String,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category_id: row.category_id,
            category_name: row.category_name,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
            location: GeoPoint::from_parts(row.lat, row.lon),
            address_description: row.address_description,
            urgency_level: UrgencyLevel::parse(&row.urgency_level),
            priority_score: row.priority_score,
            status: row.status.parse()?,
            reject_reason: row.reject_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

/// Data for inserting a new ticket
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub location: Option<GeoPoint>,
    pub address_description: String,
    pub urgency_level: UrgencyLevel,
}

/// Fields a creator may rewrite while the ticket is still PENDING
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetails {
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub address_description: String,
    pub urgency_level: UrgencyLevel,
}

/// Compare-and-commit token: the stored `(status, assigned_to)` must still match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketVersion {
    pub status: TicketStatus,
    pub assigned_to: Option<Uuid>,
}

/// Re-checked under the technician lock before an assignment commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGuard {
    pub technician_id: Uuid,
    pub max_open_tickets: i32,
}

/// Every mutable field of a ticket after a change, applied together with its
/// history row in one atomic step.
#[derive(Debug, Clone)]
pub struct TicketChange {
    pub ticket_id: Uuid,
    pub expected: TicketVersion,
    pub status: TicketStatus,
    pub assigned_to: Option<Uuid>,
    pub priority_score: f64,
    pub reject_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub capacity_guard: Option<CapacityGuard>,
    /// Replaces the descriptive fields as well when set
    pub details: Option<TicketDetails>,
    pub history: super::NewStatusHistory,
}

impl TicketChange {
    /// Start a change that leaves every field as it currently is
    pub fn from_ticket(ticket: &Ticket, history: super::NewStatusHistory) -> Self {
        Self {
            ticket_id: ticket.id,
            expected: ticket.version(),
            status: ticket.status,
            assigned_to: ticket.assigned_to,
            priority_score: ticket.priority_score,
            reject_reason: ticket.reject_reason.clone(),
            completed_at: ticket.completed_at,
            capacity_guard: None,
            details: None,
            history,
        }
    }
}
