//! Delivery attempt database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::ms_to_datetime;
use crate::domain::{DeliveryAttempt, DeliveryOutcome, PostingId};
use crate::{Error, Result};

/// Delivery attempt database model.
/// Append-only; rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeliveryAttemptDbModel {
    pub id: i64,
    pub posting_id: String,
    pub channel: String,
    pub attempted_at: i64,
    /// Outcome: sent, failed
    pub outcome: String,
}

impl TryFrom<DeliveryAttemptDbModel> for DeliveryAttempt {
    type Error = Error;

    fn try_from(row: DeliveryAttemptDbModel) -> Result<Self> {
        let outcome = DeliveryOutcome::parse(&row.outcome).ok_or_else(|| {
            Error::Database(format!(
                "unknown delivery outcome '{}' for attempt {}",
                row.outcome, row.id
            ))
        })?;
        Ok(Self {
            posting_id: PostingId::from_stored(row.posting_id),
            channel: row.channel,
            attempted_at: ms_to_datetime(row.attempted_at),
            outcome,
        })
    }
}
