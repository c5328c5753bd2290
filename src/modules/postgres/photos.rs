use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{db_error, PgStore};
use crate::core::error::Result;
use crate::features::photos::models::{CreatePhoto, Photo, PhotoKind, PhotoRow};
use crate::features::photos::repository::PhotoStore;

#[async_trait]
impl PhotoStore for PgStore {
    async fn attach_photo(&self, photo: &CreatePhoto) -> Result<Photo> {
        let row = sqlx::query_as::<_, PhotoRow>(
            r#"
            INSERT INTO before_after_photos
                (id, ticket_id, photo_type, storage_path, uploaded_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, ticket_id, photo_type, storage_path, uploaded_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(photo.ticket_id)
        .bind(photo.kind.as_str())
        .bind(&photo.storage_path)
        .bind(photo.uploaded_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("attach photo"))?;

        tracing::info!(
            "Photo attached: ticket={}, type={}, path={}",
            row.ticket_id,
            row.photo_type,
            row.storage_path
        );

        row.try_into()
    }

    async fn has_after_photo(&self, ticket_id: Uuid) -> Result<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM before_after_photos WHERE ticket_id = $1 AND photo_type = $2
            )
            "#,
        )
        .bind(ticket_id)
        .bind(PhotoKind::After.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check after photo"))
    }
}
