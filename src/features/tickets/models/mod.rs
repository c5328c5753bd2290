mod status_history;
mod ticket;

pub use status_history::{NewStatusHistory, TicketStatusHistory, TicketStatusHistoryRow};
pub use ticket::{
    CapacityGuard, CreateTicket, Ticket, TicketChange, TicketDetails, TicketRow, TicketStatus,
    TicketVersion, UrgencyLevel,
};
