pub mod models;
pub mod services;

pub use models::{NotificationKind, NotificationPayload};
pub use services::{deliver, LogNotifier, Notifier};
