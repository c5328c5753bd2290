use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event kinds delivered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Assigned,
    Reassigned,
    StatusChange,
    Completed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Assigned => "ASSIGNED",
            NotificationKind::Reassigned => "REASSIGNED",
            NotificationKind::StatusChange => "STATUS_CHANGE",
            NotificationKind::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub ticket_id: Uuid,
    pub title: String,
    pub message: String,
}

impl NotificationPayload {
    pub fn new(ticket_id: Uuid, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ticket_id,
            title: title.into(),
            message: message.into(),
        }
    }
}
