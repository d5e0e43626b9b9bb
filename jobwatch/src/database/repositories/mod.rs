//! Repository layer for database access.

pub mod posting;

pub use posting::*;
