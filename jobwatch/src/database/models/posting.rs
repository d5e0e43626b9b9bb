//! Posting database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::ms_to_datetime;
use crate::domain::{DeliveryStatus, PostingId, PostingSummary};
use crate::{Error, Result};

/// Posting database model.
/// One row per posting ever observed; frozen at first sight apart from the
/// `pending -> sent` transition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostingDbModel {
    pub posting_id: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: String,
    pub description: String,
    pub source: String,
    pub posted_date: String,
    /// Unix epoch milliseconds when the posting was first stored
    pub first_seen_at: i64,
    /// Unix epoch milliseconds of the successful delivery
    pub sent_at: Option<i64>,
    /// Channel label recorded on delivery
    pub notification_method: Option<String>,
    /// Status: pending, sent
    pub status: String,
}

impl PostingDbModel {
    pub fn id(&self) -> PostingId {
        PostingId::from_stored(&self.posting_id)
    }

    /// Parsed status. A value outside the schema's CHECK set is a database error.
    pub fn status(&self) -> Result<DeliveryStatus> {
        DeliveryStatus::parse(&self.status)
            .ok_or_else(|| Error::Database(format!("unknown posting status '{}'", self.status)))
    }

    pub fn first_seen(&self) -> chrono::DateTime<chrono::Utc> {
        ms_to_datetime(self.first_seen_at)
    }

    pub fn sent(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.sent_at.map(ms_to_datetime)
    }
}

/// Projection used by `pending_postings`.
#[derive(Debug, Clone, FromRow)]
pub struct PostingSummaryRow {
    pub posting_id: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub url: String,
    pub source: String,
}

impl From<PostingSummaryRow> for PostingSummary {
    fn from(row: PostingSummaryRow) -> Self {
        Self {
            id: PostingId::from_stored(row.posting_id),
            title: row.title,
            organization: row.organization,
            location: row.location,
            url: row.url,
            source: row.source,
        }
    }
}
