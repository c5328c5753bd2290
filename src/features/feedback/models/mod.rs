mod feedback;

pub use feedback::{CreateFeedback, TicketFeedback};
