use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::dispatch::models::{AssignmentRule, CreateAssignmentRule};

#[async_trait]
pub trait AssignmentRuleRepository: Send + Sync {
    async fn find_active(&self) -> Result<Option<AssignmentRule>>;

    /// Return the active rule, creating the default one if none is active
    async fn ensure_default(&self) -> Result<AssignmentRule>;

    /// Deactivate the current rule and activate a new one, atomically
    async fn replace_active(&self, values: &CreateAssignmentRule) -> Result<AssignmentRule>;
}
