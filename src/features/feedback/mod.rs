pub mod dtos;
pub mod models;
pub mod repository;
pub mod services;

pub use repository::FeedbackRepository;
pub use services::FeedbackService;
