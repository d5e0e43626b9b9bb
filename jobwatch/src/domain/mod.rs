//! Domain layer for jobwatch.
//!
//! Postings, their identity, and the delivery lifecycle values.

pub mod identity;
pub mod posting;

pub use identity::{POSTING_ID_LEN, PostingId};
pub use posting::{
    DeliveryAttempt, DeliveryOutcome, DeliveryStatus, Posting, PostingSummary, RawPosting,
};
