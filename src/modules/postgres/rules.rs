use async_trait::async_trait;
use chrono::Utc;

use super::{db_error, PgStore};
use crate::core::error::{AppError, Result};
use crate::features::dispatch::models::{AssignmentRule, CreateAssignmentRule};
use crate::features::dispatch::repository::AssignmentRuleRepository;

const RULE_COLUMNS: &str =
    "id, max_open_tickets, weight_distance, weight_workload, is_active, created_at";

#[async_trait]
impl AssignmentRuleRepository for PgStore {
    async fn find_active(&self) -> Result<Option<AssignmentRule>> {
        let sql = format!("SELECT {} FROM assignment_rules WHERE is_active", RULE_COLUMNS);
        sqlx::query_as::<_, AssignmentRule>(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get active assignment rule"))
    }

    async fn ensure_default(&self) -> Result<AssignmentRule> {
        let default = AssignmentRule::default_rule(Utc::now());

        // the partial unique index makes a concurrent insert a no-op
        sqlx::query(
            r#"
            INSERT INTO assignment_rules
                (id, max_open_tickets, weight_distance, weight_workload, is_active, created_at)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            ON CONFLICT (is_active) WHERE is_active DO NOTHING
            "#,
        )
        .bind(default.id)
        .bind(default.max_open_tickets)
        .bind(default.weight_distance)
        .bind(default.weight_workload)
        .bind(default.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("create default assignment rule"))?;

        self.find_active()
            .await?
            .ok_or_else(|| AppError::Internal("no active assignment rule after insert".to_string()))
    }

    async fn replace_active(&self, values: &CreateAssignmentRule) -> Result<AssignmentRule> {
        let rule = AssignmentRule::from_values(values, Utc::now());
        let mut tx = self.pool.begin().await.map_err(db_error("begin rule update"))?;

        sqlx::query("UPDATE assignment_rules SET is_active = FALSE WHERE is_active")
            .execute(&mut *tx)
            .await
            .map_err(db_error("deactivate assignment rule"))?;

        let sql = format!(
            r#"
            INSERT INTO assignment_rules
                (id, max_open_tickets, weight_distance, weight_workload, is_active, created_at)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );
        let rule = sqlx::query_as::<_, AssignmentRule>(&sql)
            .bind(rule.id)
            .bind(rule.max_open_tickets)
            .bind(rule.weight_distance)
            .bind(rule.weight_workload)
            .bind(rule.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create assignment rule"))?;

        tx.commit().await.map_err(db_error("commit rule update"))?;

        Ok(rule)
    }
}
