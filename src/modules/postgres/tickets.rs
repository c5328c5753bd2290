use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{db_error, PgStore};
use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{
    CreateTicket, NewStatusHistory, Ticket, TicketChange, TicketRow, TicketStatus,
    TicketStatusHistory, TicketStatusHistoryRow, TicketVersion,
};
use crate::features::tickets::repository::TicketRepository;
use crate::shared::geo::GeoPoint;

const TICKET_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.category_id, c.name AS category_name,
        t.created_by, t.assigned_to, t.lat, t.lon, t.address_description,
        t.urgency_level, t.priority_score, t.status, t.reject_reason,
        t.created_at, t.updated_at, t.completed_at
    FROM tickets t
    JOIN categories c ON c.id = t.category_id
"#;

fn not_open_labels() -> Vec<String> {
    TicketStatus::NOT_OPEN
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

async fn append_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &TicketStatusHistory,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ticket_status_history
            (id, ticket_id, old_status, new_status, changed_by, comment, changed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id)
    .bind(entry.ticket_id)
    .bind(entry.old_status_label())
    .bind(entry.new_status.as_str())
    .bind(entry.changed_by)
    .bind(&entry.comment)
    .bind(entry.changed_at)
    .execute(&mut **tx)
    .await
    .map_err(db_error("append ticket history"))?;

    Ok(())
}

async fn ensure_category(tx: &mut Transaction<'_, Postgres>, category_id: Uuid) -> Result<()> {
    let category: Option<(String,)> = sqlx::query_as("SELECT name FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("look up category"))?;

    match category {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!(
            "Category '{}' not found",
            category_id
        ))),
    }
}

async fn fetch_ticket(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Ticket> {
    let sql = format!("{} WHERE t.id = $1", TICKET_SELECT);
    let row = sqlx::query_as::<_, TicketRow>(&sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("reload ticket"))?;
    row.try_into()
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn insert(
        &self,
        data: &CreateTicket,
        history: NewStatusHistory,
    ) -> Result<(Ticket, TicketStatusHistory)> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin ticket insert"))?;

        ensure_category(&mut tx, data.category_id).await?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, title, description, category_id, created_by, lat, lon,
                address_description, urgency_level, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.created_by)
        .bind(data.location.map(|p| p.lat))
        .bind(data.location.map(|p| p.lon))
        .bind(&data.address_description)
        .bind(data.urgency_level.as_str())
        .bind(history.new_status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("create ticket"))?;

        let entry = history.into_entry(id, now);
        append_history(&mut tx, &entry).await?;
        let ticket = fetch_ticket(&mut tx, id).await?;

        tx.commit().await.map_err(db_error("commit ticket insert"))?;

        Ok((ticket, entry))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let sql = format!("{} WHERE t.id = $1", TICKET_SELECT);
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get ticket by ID"))?;

        row.map(Ticket::try_from).transpose()
    }

    async fn apply_change(&self, change: TicketChange) -> Result<(Ticket, TicketStatusHistory)> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin ticket change"))?;

        let current: Option<(String, Option<Uuid>)> =
            sqlx::query_as("SELECT status, assigned_to FROM tickets WHERE id = $1 FOR UPDATE")
                .bind(change.ticket_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("lock ticket"))?;

        let (status, assigned_to) = current.ok_or_else(|| {
            AppError::NotFound(format!("Ticket '{}' not found", change.ticket_id))
        })?;
        let version = TicketVersion {
            status: status.parse()?,
            assigned_to,
        };

        if version != change.expected {
            return Err(AppError::Conflict(format!(
                "Ticket '{}' changed concurrently",
                change.ticket_id
            )));
        }

        if let Some(guard) = change.capacity_guard {
            // serialises assignments to one technician until commit
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(guard.technician_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_error("lock technician"))?;

            let open: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM tickets
                WHERE assigned_to = $1 AND id <> $2 AND status <> ALL($3)
                "#,
            )
            .bind(guard.technician_id)
            .bind(change.ticket_id)
            .bind(not_open_labels())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("count open tickets"))?;

            if open >= guard.max_open_tickets as i64 {
                return Err(AppError::CapacityExceeded {
                    technician_id: guard.technician_id,
                });
            }
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE tickets
            SET status = $2, assigned_to = $3, priority_score = $4,
                reject_reason = $5, completed_at = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(change.ticket_id)
        .bind(change.status.as_str())
        .bind(change.assigned_to)
        .bind(change.priority_score)
        .bind(&change.reject_reason)
        .bind(change.completed_at)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("update ticket"))?;

        if let Some(details) = &change.details {
            ensure_category(&mut tx, details.category_id).await?;

            sqlx::query(
                r#"
                UPDATE tickets
                SET title = $2, description = $3, category_id = $4,
                    address_description = $5, urgency_level = $6
                WHERE id = $1
                "#,
            )
            .bind(change.ticket_id)
            .bind(&details.title)
            .bind(&details.description)
            .bind(details.category_id)
            .bind(&details.address_description)
            .bind(details.urgency_level.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("update ticket details"))?;
        }

        let entry = change.history.into_entry(change.ticket_id, now);
        append_history(&mut tx, &entry).await?;
        let ticket = fetch_ticket(&mut tx, change.ticket_id).await?;

        tx.commit().await.map_err(db_error("commit ticket change"))?;

        Ok((ticket, entry))
    }

    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketStatusHistory>> {
        let rows = sqlx::query_as::<_, TicketStatusHistoryRow>(
            r#"
            SELECT id, ticket_id, old_status, new_status, changed_by, comment, changed_at
            FROM ticket_status_history
            WHERE ticket_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list ticket history"))?;

        rows.into_iter().map(TicketStatusHistory::try_from).collect()
    }

    async fn count_open_assigned(
        &self,
        technician_id: Uuid,
        exclude_ticket: Option<Uuid>,
    ) -> Result<i64> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tickets
            WHERE assigned_to = $1
              AND ($2::uuid IS NULL OR id <> $2)
              AND status <> ALL($3)
            "#,
        )
        .bind(technician_id)
        .bind(exclude_ticket)
        .bind(not_open_labels())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count open tickets"))
    }

    async fn count_nearby_since(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        since: DateTime<Utc>,
        exclude_ticket: Uuid,
    ) -> Result<i64> {
        let bbox = center.bounding_box(radius_meters);

        // Bounding box in SQL, exact planar distance here
        let points: Vec<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT lat, lon FROM tickets
            WHERE id <> $1
              AND created_at >= $2
              AND lat BETWEEN $3 AND $4
              AND lon BETWEEN $5 AND $6
            "#,
        )
        .bind(exclude_ticket)
        .bind(since)
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lon)
        .bind(bbox.max_lon)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("find nearby tickets"))?;

        let count = points
            .into_iter()
            .filter(|(lat, lon)| GeoPoint::new(*lat, *lon).distance_meters(&center) <= radius_meters)
            .count();

        Ok(count as i64)
    }

    async fn list_assigned_active(&self, technician_id: Uuid) -> Result<Vec<Ticket>> {
        let sql = format!(
            "{} WHERE t.assigned_to = $1 AND t.status NOT IN ('CLOSED', 'REJECTED') ORDER BY t.created_at DESC",
            TICKET_SELECT
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(technician_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list technician jobs"))?;

        rows.into_iter().map(Ticket::try_from).collect()
    }

    async fn list_unassigned_pending(&self) -> Result<Vec<Ticket>> {
        let sql = format!(
            "{} WHERE t.status = 'PENDING' AND t.assigned_to IS NULL ORDER BY t.created_at ASC",
            TICKET_SELECT
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list unassigned tickets"))?;

        rows.into_iter().map(Ticket::try_from).collect()
    }
}
