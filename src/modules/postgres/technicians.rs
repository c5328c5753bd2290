use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{db_error, PgStore};
use crate::core::error::Result;
use crate::features::technicians::models::{
    Technician, TechnicianPresence, TechnicianPresenceRow, TechnicianRow,
};
use crate::features::technicians::repository::{PresenceRepository, TechnicianRoster};
use crate::shared::geo::GeoPoint;

#[async_trait]
impl TechnicianRoster for PgStore {
    async fn list_technicians(&self) -> Result<Vec<Technician>> {
        let rows = sqlx::query_as::<_, TechnicianRow>(
            r#"
            SELECT id, username, display_name, role, is_active
            FROM users
            WHERE role = 'technician'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list technicians"))?;

        rows.into_iter().map(Technician::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>> {
        let row = sqlx::query_as::<_, TechnicianRow>(
            r#"
            SELECT id, username, display_name, role, is_active
            FROM users
            WHERE id = $1 AND role = 'technician'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get technician by ID"))?;

        row.map(Technician::try_from).transpose()
    }
}

#[async_trait]
impl PresenceRepository for PgStore {
    async fn find(&self, technician_id: Uuid) -> Result<Option<TechnicianPresence>> {
        let row = sqlx::query_as::<_, TechnicianPresenceRow>(
            r#"
            SELECT technician_id, lat, lon, is_available, updated_at
            FROM technician_presence
            WHERE technician_id = $1
            "#,
        )
        .bind(technician_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get technician presence"))?;

        Ok(row.map(TechnicianPresence::from))
    }

    async fn toggle_availability(&self, technician_id: Uuid) -> Result<TechnicianPresence> {
        // A missing record counts as available, so inserting it already toggled means unavailable
        let row = sqlx::query_as::<_, TechnicianPresenceRow>(
            r#"
            INSERT INTO technician_presence (technician_id, is_available, updated_at)
            VALUES ($1, FALSE, $2)
            ON CONFLICT (technician_id) DO UPDATE
            SET is_available = NOT technician_presence.is_available,
                updated_at = EXCLUDED.updated_at
            RETURNING technician_id, lat, lon, is_available, updated_at
            "#,
        )
        .bind(technician_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("toggle technician availability"))?;

        Ok(row.into())
    }

    async fn set_location(
        &self,
        technician_id: Uuid,
        location: Option<GeoPoint>,
    ) -> Result<TechnicianPresence> {
        let row = sqlx::query_as::<_, TechnicianPresenceRow>(
            r#"
            INSERT INTO technician_presence (technician_id, lat, lon, is_available, updated_at)
            VALUES ($1, $2, $3, TRUE, $4)
            ON CONFLICT (technician_id) DO UPDATE
            SET lat = EXCLUDED.lat,
                lon = EXCLUDED.lon,
                updated_at = EXCLUDED.updated_at
            RETURNING technician_id, lat, lon, is_available, updated_at
            "#,
        )
        .bind(technician_id)
        .bind(location.map(|p| p.lat))
        .bind(location.map(|p| p.lon))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("update technician location"))?;

        Ok(row.into())
    }
}
