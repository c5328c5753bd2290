use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::tickets::models::TicketStatus;

/// Append-only audit record of one status transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketStatusHistory {
    pub id: Uuid,
    pub ticket_id: Uuid,
    /// `None` only for the row written when the ticket is created
    pub old_status: Option<TicketStatus>,
    pub new_status: TicketStatus,
    /// `None` means the automatic dispatcher made the change
    pub changed_by: Option<Uuid>,
    pub comment: String,
    pub changed_at: DateTime<Utc>,
}

impl TicketStatusHistory {
    /// Stored form of `old_status`; empty for the creation row
    pub fn old_status_label(&self) -> &'static str {
        self.old_status.map(|s| s.as_str()).unwrap_or("")
    }

    pub fn is_automatic(&self) -> bool {
        self.changed_by.is_none()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TicketStatusHistoryRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Option<Uuid>,
    pub comment: String,
    pub changed_at: DateTime<Utc>,
}

impl TryFrom<TicketStatusHistoryRow> for TicketStatusHistory {
    type Error = AppError;

    fn try_from(row: TicketStatusHistoryRow) -> Result<Self, Self::Error> {
        let old_status = if row.old_status.is_empty() {
            None
        } else {
            Some(row.old_status.parse()?)
        };

        Ok(Self {
            id: row.id,
            ticket_id: row.ticket_id,
            old_status,
            new_status: row.new_status.parse()?,
            changed_by: row.changed_by,
            comment: row.comment,
            changed_at: row.changed_at,
        })
    }
}

/// History row to be appended alongside a ticket change
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatusHistory {
    pub old_status: Option<TicketStatus>,
    pub new_status: TicketStatus,
    pub changed_by: Option<Uuid>,
    pub comment: String,
}

impl NewStatusHistory {
    pub fn new(
        old_status: Option<TicketStatus>,
        new_status: TicketStatus,
        changed_by: Option<Uuid>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            old_status,
            new_status,
            changed_by,
            comment: comment.into(),
        }
    }

    /// Materialise the row. Ids are UUIDv7 so they sort by creation time
    /// when two rows share a timestamp.
    pub fn into_entry(self, ticket_id: Uuid, changed_at: DateTime<Utc>) -> TicketStatusHistory {
        TicketStatusHistory {
            id: Uuid::now_v7(),
            ticket_id,
            old_status: self.old_status,
            new_status: self.new_status,
            changed_by: self.changed_by,
            comment: self.comment,
            changed_at,
        }
    }
}
