use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::photos::models::{CreatePhoto, Photo};

/// Photo/attachment store. Completion is gated on an after-photo existing.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn attach_photo(&self, photo: &CreatePhoto) -> Result<Photo>;

    async fn has_after_photo(&self, ticket_id: Uuid) -> Result<bool>;
}
