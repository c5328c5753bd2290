use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::technicians::models::{Technician, TechnicianPresence};
use crate::shared::geo::GeoPoint;

/// Identity/roster provider
#[async_trait]
pub trait TechnicianRoster: Send + Sync {
    /// Every account with the technician role, active or not
    async fn list_technicians(&self) -> Result<Vec<Technician>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>>;
}

/// Presence records, one per technician, created lazily
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    async fn find(&self, technician_id: Uuid) -> Result<Option<TechnicianPresence>>;

    /// Create the record as available if missing, then flip availability
    async fn toggle_availability(&self, technician_id: Uuid) -> Result<TechnicianPresence>;

    /// Create the record as available if missing, then set its location
    async fn set_location(
        &self,
        technician_id: Uuid,
        location: Option<GeoPoint>,
    ) -> Result<TechnicianPresence>;
}
