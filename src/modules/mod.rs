//! Modules layer - storage backends behind the feature repository traits

pub mod memory;
pub mod postgres;
