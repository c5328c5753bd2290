pub mod dispatch;
pub mod feedback;
pub mod notifications;
pub mod photos;
pub mod technicians;
pub mod tickets;
