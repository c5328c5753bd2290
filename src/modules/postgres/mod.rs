//! PostgreSQL storage backend
//!
//! Implements the repository traits on a `PgPool`. Ticket mutations run in a
//! transaction that locks the ticket row and, when assigning, takes a
//! per-technician advisory lock before re-counting open tickets.

mod feedback;
mod notifier;
mod photos;
mod rules;
mod technicians;
mod tickets;

use sqlx::PgPool;

use crate::core::error::AppError;

pub use notifier::PgNotifier;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Log a storage failure and map it into `AppError::Database`
fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", action, e);
        AppError::Database(e)
    }
}
