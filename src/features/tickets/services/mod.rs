mod ticket_service;
pub mod workflow_service;

pub use ticket_service::{CreatedTicket, TicketService};
pub use workflow_service::{Transition, TransitionOutcome, WorkflowService};
