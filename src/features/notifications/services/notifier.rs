use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notifications::models::{NotificationKind, NotificationPayload};

/// Delivery of user notifications. At-least-once is acceptable.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: NotificationPayload,
    ) -> Result<()>;
}

/// Notifier that only writes a log line
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: NotificationPayload,
    ) -> Result<()> {
        tracing::info!(
            "Notification {} for user {} (ticket {}): {}",
            kind,
            user_id,
            payload.ticket_id,
            payload.message
        );
        Ok(())
    }
}

/// Send after the state change has committed. Failures are logged and
/// swallowed; they never undo the change or reach the caller.
pub async fn deliver(
    notifier: &Arc<dyn Notifier>,
    user_id: Uuid,
    kind: NotificationKind,
    payload: NotificationPayload,
) {
    let ticket_id = payload.ticket_id;
    if let Err(e) = notifier.notify(user_id, kind, payload).await {
        tracing::warn!(
            "Failed to deliver {} notification to {} for ticket {}: {:?}",
            kind,
            user_id,
            ticket_id,
            e
        );
    }
}
