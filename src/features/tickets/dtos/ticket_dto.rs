use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::tickets::models::{Ticket, TicketDetails, TicketStatus, UrgencyLevel};
use crate::shared::geo::GeoPoint;

/// Request DTO for reporting a problem
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    #[serde(default)]
    pub description: String,

    pub category_id: Uuid,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[validate(length(max = 255, message = "Location note must not exceed 255 characters"))]
    #[serde(default)]
    pub address_description: String,

    #[serde(default)]
    pub urgency_level: UrgencyLevel,
}

impl CreateTicketDto {
    /// Coordinates count only when both halves are given
    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// Request DTO for a creator rewriting a PENDING ticket
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    #[serde(default)]
    pub description: String,

    pub category_id: Uuid,

    #[validate(length(max = 255, message = "Location note must not exceed 255 characters"))]
    #[serde(default)]
    pub address_description: String,

    #[serde(default)]
    pub urgency_level: UrgencyLevel,
}

impl UpdateTicketDto {
    pub fn into_details(self) -> TicketDetails {
        TicketDetails {
            title: self.title.trim().to_string(),
            description: self.description,
            category_id: self.category_id,
            address_description: self.address_description,
            urgency_level: self.urgency_level,
        }
    }
}

/// One row of a technician's job list
#[derive(Debug, Clone, Serialize)]
pub struct JobListItemDto {
    pub id: Uuid,
    pub title: String,
    pub category_name: String,
    pub status: TicketStatus,
    pub urgency_level: UrgencyLevel,
    pub priority_score: f64,
    pub location: Option<GeoPoint>,
    pub address_description: String,
    pub created_at: DateTime<Utc>,
    pub is_overdue: bool,
}

impl JobListItemDto {
    pub fn from_ticket(ticket: Ticket, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: ticket.is_overdue(now),
            id: ticket.id,
            title: ticket.title,
            category_name: ticket.category_name,
            status: ticket.status,
            urgency_level: ticket.urgency_level,
            priority_score: ticket.priority_score,
            location: ticket.location,
            address_description: ticket.address_description,
            created_at: ticket.created_at,
        }
    }
}
