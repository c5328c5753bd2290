mod presence;
mod technician;

pub use presence::{Availability, TechnicianPresence, TechnicianPresenceRow};
pub use technician::{Technician, TechnicianRow};
