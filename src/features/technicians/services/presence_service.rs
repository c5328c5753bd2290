use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::technicians::models::{Availability, Technician, TechnicianPresence};
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::shared::geo::GeoPoint;

/// Service for technician availability and location
pub struct PresenceService {
    roster: Arc<dyn TechnicianRoster>,
    presence: Arc<dyn PresenceRepository>,
}

impl PresenceService {
    pub fn new(roster: Arc<dyn TechnicianRoster>, presence: Arc<dyn PresenceRepository>) -> Self {
        Self { roster, presence }
    }

    async fn technician(&self, technician_id: Uuid) -> Result<Technician> {
        self.roster
            .find_by_id(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technician '{}' not found", technician_id)))
    }

    /// Tri-state availability as the dispatcher sees it
    pub async fn availability(&self, technician_id: Uuid) -> Result<Availability> {
        let presence = self.presence.find(technician_id).await?;
        Ok(Availability::from_presence(presence.as_ref()))
    }

    /// Flip availability. A technician without a record starts available, so
    /// the first toggle takes them off shift.
    pub async fn toggle_availability(&self, technician_id: Uuid) -> Result<TechnicianPresence> {
        let technician = self.technician(technician_id).await?;
        let presence = self.presence.toggle_availability(technician.id).await?;

        tracing::info!(
            "Technician {} is now {}",
            technician.name(),
            if presence.is_available { "available" } else { "unavailable" }
        );

        Ok(presence)
    }

    /// Record the technician's current position, or clear it with `None`
    pub async fn update_location(
        &self,
        technician_id: Uuid,
        location: Option<GeoPoint>,
    ) -> Result<TechnicianPresence> {
        if let Some(point) = location {
            if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon) {
                return Err(AppError::Validation(format!(
                    "Coordinate ({}, {}) is out of range",
                    point.lat, point.lon
                )));
            }
        }

        let technician = self.technician(technician_id).await?;
        let presence = self.presence.set_location(technician.id, location).await?;

        tracing::debug!("Technician {} location set to {:?}", technician.id, location);

        Ok(presence)
    }
}
