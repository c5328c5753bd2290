pub mod dtos;
pub mod models;
pub mod repository;
pub mod services;

pub use repository::TicketRepository;
pub use services::{CreatedTicket, TicketService, TransitionOutcome, WorkflowService};
