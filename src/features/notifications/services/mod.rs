mod notifier;

pub use notifier::{deliver, LogNotifier, Notifier};
