//! jobwatch library crate.
//!
//! Watches job boards for new postings, remembers every posting it has seen
//! in SQLite, and pushes each new one to the configured notification channels.

pub mod config;
pub mod coordinator;
pub mod database;
pub mod domain;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod sources;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
