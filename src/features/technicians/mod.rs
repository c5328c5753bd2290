pub mod models;
pub mod repository;
pub mod services;

pub use repository::{PresenceRepository, TechnicianRoster};
pub use services::PresenceService;
