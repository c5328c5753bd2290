use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::types::UserRole;

/// Roster entry supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Technician {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

impl Technician {
    /// Display name if set, else username
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// Active technician accounts are the only dispatch candidates
    pub fn is_dispatchable(&self) -> bool {
        self.role == UserRole::Technician && self.is_active
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TechnicianRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    pub is_active: bool,
}

impl TryFrom<TechnicianRow> for Technician {
    type Error = crate::core::error::AppError;

    fn try_from(row: TechnicianRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(crate::core::error::AppError::Validation)?;

        Ok(Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            role,
            is_active: row.is_active,
        })
    }
}
