pub mod models;
pub mod repository;

pub use models::{CreatePhoto, Photo, PhotoKind};
pub use repository::PhotoStore;
