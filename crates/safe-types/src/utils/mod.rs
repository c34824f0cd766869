//! Utility helpers shared across crates.

pub mod formatting;

pub use formatting::{short_address, truncate_id};
