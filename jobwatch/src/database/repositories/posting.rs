//! Posting repository.
//!
//! The single authority on whether a posting has been seen. Uniqueness is
//! enforced by the `postings.posting_id` constraint, so concurrent writers
//! from separate processes cannot both insert the same posting.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::database::models::{DeliveryAttemptDbModel, PostingDbModel, PostingSummaryRow};
use crate::database::retry::retry_on_sqlite_busy;
use crate::database::time::now_ms;
use crate::domain::{
    DeliveryAttempt, DeliveryOutcome, DeliveryStatus, Posting, PostingId, PostingSummary,
};
use crate::{Error, Result};

/// Result of trying to store a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The posting was new and is now stored as `pending`.
    Inserted,
    /// A posting with the same identifier was already stored.
    AlreadyExists,
}

/// Posting repository trait.
#[async_trait]
pub trait PostingRepository: Send + Sync {
    /// True iff a posting with this identifier has ever been stored.
    async fn exists(&self, id: &PostingId) -> Result<bool>;

    /// Store a new posting as `pending`, stamped with the current time.
    async fn add(&self, posting: &Posting) -> Result<AddOutcome>;

    /// Transition `pending -> sent` and append a `sent` delivery attempt.
    ///
    /// Returns [`Error::NotFound`] when the identifier was never stored and
    /// [`Error::InvalidStateTransition`] when it was already sent.
    async fn mark_sent(&self, id: &PostingId, method: &str) -> Result<()>;

    /// Append a `failed` delivery attempt for one channel.
    async fn record_failed_attempt(&self, id: &PostingId, channel: &str) -> Result<()>;

    /// Posting counts grouped by status. Absent statuses have no entry.
    async fn counts_by_status(&self) -> Result<HashMap<DeliveryStatus, u64>>;

    /// All postings still `pending`, in no particular order.
    async fn pending_postings(&self) -> Result<Vec<PostingSummary>>;

    async fn get_posting(&self, id: &PostingId) -> Result<PostingDbModel>;

    /// Delivery attempts for a posting, in insertion order.
    async fn attempts_for(&self, id: &PostingId) -> Result<Vec<DeliveryAttempt>>;
}

/// SQLx implementation of PostingRepository.
pub struct SqlxPostingRepository {
    pool: SqlitePool,
}

impl SqlxPostingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn add_once(&self, posting: &Posting) -> Result<AddOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO postings (
                posting_id, title, organization, location, url, description,
                source, posted_date, first_seen_at, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(posting_id) DO NOTHING
            "#,
        )
        .bind(posting.id.as_str())
        .bind(&posting.title)
        .bind(&posting.organization)
        .bind(&posting.location)
        .bind(&posting.url)
        .bind(&posting.description)
        .bind(&posting.source)
        .bind(&posting.posted_date)
        .bind(now_ms())
        .bind(DeliveryStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(AddOutcome::AlreadyExists)
        } else {
            Ok(AddOutcome::Inserted)
        }
    }

    async fn mark_sent_once(&self, id: &PostingId, method: &str) -> Result<()> {
        let now = now_ms();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE postings SET
                status = ?,
                sent_at = ?,
                notification_method = ?
            WHERE posting_id = ? AND status = ?
            "#,
        )
        .bind(DeliveryStatus::Sent.as_str())
        .bind(now)
        .bind(method)
        .bind(id.as_str())
        .bind(DeliveryStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let status: Option<String> =
                sqlx::query_scalar("SELECT status FROM postings WHERE posting_id = ?")
                    .bind(id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(match status {
                None => Error::not_found("Posting", id.as_str()),
                Some(from) => Error::InvalidStateTransition {
                    from,
                    to: DeliveryStatus::Sent.to_string(),
                },
            });
        }

        sqlx::query(
            r#"
            INSERT INTO delivery_attempts (posting_id, channel, attempted_at, outcome)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(method)
        .bind(now)
        .bind(DeliveryOutcome::Sent.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_failed_attempt_once(&self, id: &PostingId, channel: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_attempts (posting_id, channel, attempted_at, outcome)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(channel)
        .bind(now_ms())
        .bind(DeliveryOutcome::Failed.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PostingRepository for SqlxPostingRepository {
    async fn exists(&self, id: &PostingId) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM postings WHERE posting_id = ? LIMIT 1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn add(&self, posting: &Posting) -> Result<AddOutcome> {
        retry_on_sqlite_busy("add_posting", || self.add_once(posting)).await
    }

    async fn mark_sent(&self, id: &PostingId, method: &str) -> Result<()> {
        retry_on_sqlite_busy("mark_posting_sent", || self.mark_sent_once(id, method)).await
    }

    async fn record_failed_attempt(&self, id: &PostingId, channel: &str) -> Result<()> {
        retry_on_sqlite_busy("record_failed_attempt", || {
            self.record_failed_attempt_once(id, channel)
        })
        .await
    }

    async fn counts_by_status(&self) -> Result<HashMap<DeliveryStatus, u64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM postings GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for (status, count) in rows {
            let status = DeliveryStatus::parse(&status)
                .ok_or_else(|| Error::Database(format!("unknown posting status '{status}'")))?;
            counts.insert(status, count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn pending_postings(&self) -> Result<Vec<PostingSummary>> {
        let rows = sqlx::query_as::<_, PostingSummaryRow>(
            r#"
            SELECT posting_id, title, organization, location, url, source
            FROM postings
            WHERE status = ?
            "#,
        )
        .bind(DeliveryStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PostingSummary::from).collect())
    }

    async fn get_posting(&self, id: &PostingId) -> Result<PostingDbModel> {
        sqlx::query_as::<_, PostingDbModel>(
            r#"
            SELECT posting_id, title, organization, location, url, description, source,
                   posted_date, first_seen_at, sent_at, notification_method, status
            FROM postings WHERE posting_id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("Posting", id.as_str()))
    }

    async fn attempts_for(&self, id: &PostingId) -> Result<Vec<DeliveryAttempt>> {
        let rows = sqlx::query_as::<_, DeliveryAttemptDbModel>(
            "SELECT * FROM delivery_attempts WHERE posting_id = ? ORDER BY id",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DeliveryAttempt::try_from).collect()
    }
}
