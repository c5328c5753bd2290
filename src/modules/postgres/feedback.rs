use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{db_error, PgStore};
use crate::core::error::{AppError, Result};
use crate::features::feedback::models::{CreateFeedback, TicketFeedback};
use crate::features::feedback::repository::FeedbackRepository;

const FEEDBACK_COLUMNS: &str = r#"
    id, ticket_id, created_by, technician_id, overall_rating, response_speed_rating,
    work_quality_rating, politeness_rating, cleanliness_rating, comment, created_at
"#;

#[async_trait]
impl FeedbackRepository for PgStore {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketFeedback>> {
        let sql = format!(
            "SELECT {} FROM ticket_feedbacks WHERE ticket_id = $1",
            FEEDBACK_COLUMNS
        );
        sqlx::query_as::<_, TicketFeedback>(&sql)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get ticket feedback"))
    }

    async fn insert(&self, data: &CreateFeedback) -> Result<TicketFeedback> {
        let sql = format!(
            r#"
            INSERT INTO ticket_feedbacks (
                id, ticket_id, created_by, technician_id, overall_rating, response_speed_rating,
                work_quality_rating, politeness_rating, cleanliness_rating, comment, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            FEEDBACK_COLUMNS
        );

        sqlx::query_as::<_, TicketFeedback>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.ticket_id)
            .bind(data.created_by)
            .bind(data.technician_id)
            .bind(data.overall_rating)
            .bind(data.response_speed_rating)
            .bind(data.work_quality_rating)
            .bind(data.politeness_rating)
            .bind(data.cleanliness_rating)
            .bind(&data.comment)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(
                    format!("Feedback for ticket '{}' already submitted", data.ticket_id),
                ),
                e => {
                    tracing::error!("Failed to create ticket feedback: {:?}", e);
                    AppError::Database(e)
                }
            })
    }
}
