use std::sync::Arc;

use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::dispatch::dtos::UpdateAssignmentRuleDto;
use crate::features::dispatch::models::AssignmentRule;
use crate::features::dispatch::repository::AssignmentRuleRepository;

/// Service for the active assignment rule
pub struct AssignmentRuleService {
    rules: Arc<dyn AssignmentRuleRepository>,
}

impl AssignmentRuleService {
    pub fn new(rules: Arc<dyn AssignmentRuleRepository>) -> Self {
        Self { rules }
    }

    /// Materialise the default rule if none is active
    pub async fn ensure_default(&self) -> Result<AssignmentRule> {
        let rule = self.rules.ensure_default().await?;
        tracing::info!(
            "Active assignment rule {}: max_open={}, distance={}, workload={}",
            rule.id,
            rule.max_open_tickets,
            rule.weight_distance,
            rule.weight_workload
        );
        Ok(rule)
    }

    /// The rule to inject into the next dispatch call
    pub async fn active_rule(&self) -> Result<AssignmentRule> {
        match self.rules.find_active().await? {
            Some(rule) => Ok(rule),
            None => self.rules.ensure_default().await,
        }
    }

    /// Replace the active rule; the previous one is deactivated in the same step
    pub async fn update_rule(&self, dto: UpdateAssignmentRuleDto) -> Result<AssignmentRule> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let rule = self.rules.replace_active(&dto.into()).await?;

        tracing::info!(
            "Assignment rule replaced: id={}, max_open={}, distance={}, workload={}",
            rule.id,
            rule.max_open_tickets,
            rule.weight_distance,
            rule.weight_workload
        );

        Ok(rule)
    }
}
