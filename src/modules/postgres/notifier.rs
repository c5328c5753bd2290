use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::{NotificationKind, NotificationPayload, Notifier};

/// Notifier that writes to the `notifications` inbox table
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: NotificationPayload,
    ) -> Result<()> {
        let body = serde_json::to_value(&payload)
            .map_err(|e| AppError::Internal(format!("Failed to encode notification: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, ticket_id, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(payload.ticket_id)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store notification: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::debug!("Notification {} queued for {}", kind, user_id);

        Ok(())
    }
}
