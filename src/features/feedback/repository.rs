use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::feedback::models::{CreateFeedback, TicketFeedback};

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn find_by_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketFeedback>>;

    /// Fails with `Conflict` if the ticket already has feedback
    async fn insert(&self, data: &CreateFeedback) -> Result<TicketFeedback>;
}
