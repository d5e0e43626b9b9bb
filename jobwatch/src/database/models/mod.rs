//! Database models (row shapes) for jobwatch tables.

pub mod delivery_attempt;
pub mod posting;

pub use delivery_attempt::*;
pub use posting::*;
