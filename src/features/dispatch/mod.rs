pub mod dtos;
pub mod models;
pub mod repository;
pub mod services;

pub use repository::AssignmentRuleRepository;
pub use services::{AssignmentRuleService, DispatchReport, Dispatcher};
