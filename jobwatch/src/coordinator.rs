//! Delivery coordinator.
//!
//! Runs each observed posting through the store and, when it is new, fans it
//! out to every registered channel:
//!
//! ```text
//! observed -> exists? -> yes: skip
//!                     -> no: add -> AlreadyExists: skip (another writer won)
//!                                -> Inserted: deliver on each channel
//!                                     -> any true:  mark_sent(id, label)
//!                                     -> all false: stays pending
//! ```
//!
//! A stored posting is never delivered again, even when every channel failed:
//! `exists` is true from then on, so delivery is at-most-once per identifier.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::database::{AddOutcome, PostingRepository};
use crate::domain::{Posting, RawPosting};
use crate::notification::NotificationChannel;

/// Method label recorded when more than one channel is registered.
pub const MULTI_CHANNEL_METHOD: &str = "multi-channel";

/// Method label recorded when no channel is registered.
const NO_CHANNEL_METHOD: &str = "none";

/// What happened to one observed posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingOutcome {
    /// Already stored before this cycle looked at it.
    Duplicate,
    /// `exists` said no but the insert hit the uniqueness constraint.
    LostRace,
    /// Stored and accepted by at least one channel.
    Delivered,
    /// Stored, but every channel failed. Stays pending.
    Undelivered,
}

impl PostingOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Delivered | Self::Undelivered)
    }
}

/// Counts reported to the outer driver after a checking cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Postings stored for the first time in this cycle.
    pub new_count: usize,
    /// New postings accepted by at least one channel.
    pub sent_count: usize,
    /// Raw postings observed in this cycle, duplicates included.
    pub total_count: usize,
}

pub struct DeliveryCoordinator {
    repo: Arc<dyn PostingRepository>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    delivery_timeout: Duration,
}

impl DeliveryCoordinator {
    pub fn new(
        repo: Arc<dyn PostingRepository>,
        channels: Vec<Arc<dyn NotificationChannel>>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            channels,
            delivery_timeout,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PostingRepository> {
        &self.repo
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Label stored in `notification_method` on success.
    pub fn method_label(&self) -> &'static str {
        match self.channels.as_slice() {
            [] => NO_CHANNEL_METHOD,
            [only] => only.channel_type(),
            _ => MULTI_CHANNEL_METHOD,
        }
    }

    /// Run one observed posting through the dedup and delivery state machine.
    ///
    /// Storage faults and logic errors are returned; channel failures never are.
    pub async fn process(&self, raw: RawPosting) -> Result<PostingOutcome> {
        let posting = raw.identify();

        if self.repo.exists(&posting.id).await? {
            debug!(posting_id = %posting.id.short(), "Posting already seen");
            return Ok(PostingOutcome::Duplicate);
        }

        match self.repo.add(&posting).await? {
            AddOutcome::AlreadyExists => {
                debug!(
                    posting_id = %posting.id.short(),
                    "Posting stored concurrently by another writer"
                );
                Ok(PostingOutcome::LostRace)
            }
            AddOutcome::Inserted => {
                info!(
                    posting_id = %posting.id.short(),
                    source = %posting.source,
                    "New posting: {} at {}",
                    posting.title,
                    posting.organization
                );
                if self.deliver_new(&posting).await? {
                    Ok(PostingOutcome::Delivered)
                } else {
                    Ok(PostingOutcome::Undelivered)
                }
            }
        }
    }

    /// Try every channel once, then reconcile the store.
    ///
    /// The store is only written after all channels have answered, and a
    /// success is marked before failures are logged, so a later storage
    /// fault cannot leave a delivered posting `pending`.
    ///
    /// Returns whether any channel accepted the posting.
    async fn deliver_new(&self, posting: &Posting) -> Result<bool> {
        let mut failed_channels = Vec::new();
        for channel in &self.channels {
            if !channel.deliver(posting, self.delivery_timeout).await {
                failed_channels.push(channel.channel_type());
            }
        }
        let delivered = failed_channels.len() < self.channels.len();

        if delivered {
            if let Err(e) = self.repo.mark_sent(&posting.id, self.method_label()).await {
                if e.is_logic_error() {
                    error!(
                        posting_id = %posting.id,
                        error = %e,
                        "mark_sent rejected a posting that was just inserted"
                    );
                }
                return Err(e);
            }
        } else {
            warn!(
                posting_id = %posting.id.short(),
                channels = self.channels.len(),
                "No channel accepted the posting; it stays pending"
            );
        }

        for channel in failed_channels {
            self.repo
                .record_failed_attempt(&posting.id, channel)
                .await?;
        }

        Ok(delivered)
    }

    /// One full dedup and delivery pass over the postings a fetch produced.
    ///
    /// The first storage fault aborts the rest of the cycle; postings already
    /// handled stay committed.
    pub async fn run_checking_cycle(
        &self,
        keywords: &[String],
        raw_postings: Vec<RawPosting>,
    ) -> Result<CycleSummary> {
        let mut summary = CycleSummary {
            total_count: raw_postings.len(),
            ..Default::default()
        };

        debug!(
            keywords = keywords.len(),
            postings = raw_postings.len(),
            "Checking cycle started"
        );

        for raw in raw_postings {
            let outcome = self.process(raw).await?;
            if outcome.is_new() {
                summary.new_count += 1;
            }
            if outcome == PostingOutcome::Delivered {
                summary.sent_count += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PostingDbModel;
    use crate::domain::{DeliveryAttempt, DeliveryStatus, PostingId, PostingSummary};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Repository that reports "not seen" but refuses inserts, or faults on demand.
    #[derive(Default)]
    struct ScriptedRepository {
        insert_conflicts: bool,
        fault_after_adds: Option<usize>,
        fault_on_failed_attempt: bool,
        adds: AtomicUsize,
        marked: Mutex<Vec<(PostingId, String)>>,
        failed: Mutex<Vec<(PostingId, String)>>,
    }

    #[async_trait]
    impl PostingRepository for ScriptedRepository {
        async fn exists(&self, _id: &PostingId) -> Result<bool> {
            Ok(false)
        }

        async fn add(&self, _posting: &Posting) -> Result<AddOutcome> {
            let n = self.adds.fetch_add(1, Ordering::SeqCst);
            if self.fault_after_adds.is_some_and(|limit| n >= limit) {
                return Err(Error::Database("disk I/O error".to_string()));
            }
            if self.insert_conflicts {
                Ok(AddOutcome::AlreadyExists)
            } else {
                Ok(AddOutcome::Inserted)
            }
        }

        async fn mark_sent(&self, id: &PostingId, method: &str) -> Result<()> {
            self.marked
                .lock()
                .unwrap()
                .push((id.clone(), method.to_string()));
            Ok(())
        }

        async fn record_failed_attempt(&self, id: &PostingId, channel: &str) -> Result<()> {
            if self.fault_on_failed_attempt {
                return Err(Error::Database("disk I/O error".to_string()));
            }
            self.failed
                .lock()
                .unwrap()
                .push((id.clone(), channel.to_string()));
            Ok(())
        }

        async fn counts_by_status(&self) -> Result<HashMap<DeliveryStatus, u64>> {
            Ok(HashMap::new())
        }

        async fn pending_postings(&self) -> Result<Vec<PostingSummary>> {
            Ok(Vec::new())
        }

        async fn get_posting(&self, id: &PostingId) -> Result<PostingDbModel> {
            Err(Error::not_found("Posting", id.as_str()))
        }

        async fn attempts_for(&self, _id: &PostingId) -> Result<Vec<DeliveryAttempt>> {
            Ok(Vec::new())
        }
    }

    struct StubChannel {
        name: &'static str,
        accept: bool,
        calls: AtomicUsize,
    }

    impl StubChannel {
        fn new(name: &'static str, accept: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                accept,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NotificationChannel for StubChannel {
        fn channel_type(&self) -> &'static str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            true
        }

        async fn send(&self, _posting: &Posting) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                Ok(())
            } else {
                Err(Error::Other("rejected".to_string()))
            }
        }
    }

    fn dyn_channel(channel: &Arc<StubChannel>) -> Arc<dyn NotificationChannel> {
        channel.clone()
    }

    fn raw(n: usize) -> RawPosting {
        RawPosting {
            title: format!("SWE Intern {n}"),
            organization: "Acme".to_string(),
            url: format!("https://x/{n}"),
            source: "Demo".to_string(),
            ..Default::default()
        }
    }

    fn coordinator(
        repo: Arc<ScriptedRepository>,
        channels: Vec<Arc<dyn NotificationChannel>>,
    ) -> DeliveryCoordinator {
        DeliveryCoordinator::new(repo, channels, Duration::from_secs(1))
    }

    #[test]
    fn test_method_label() {
        let repo = Arc::new(ScriptedRepository::default());
        assert_eq!(coordinator(repo.clone(), vec![]).method_label(), "none");
        assert_eq!(
            coordinator(repo.clone(), vec![dyn_channel(&StubChannel::new("telegram", true))])
                .method_label(),
            "telegram"
        );
        assert_eq!(
            coordinator(
                repo,
                vec![
                    dyn_channel(&StubChannel::new("telegram", true)),
                    dyn_channel(&StubChannel::new("email", true)),
                ]
            )
            .method_label(),
            MULTI_CHANNEL_METHOD
        );
    }

    #[tokio::test]
    async fn test_lost_race_skips_delivery() {
        let repo = Arc::new(ScriptedRepository {
            insert_conflicts: true,
            ..Default::default()
        });
        let channel = StubChannel::new("telegram", true);
        let coord = coordinator(repo.clone(), vec![dyn_channel(&channel)]);

        let outcome = coord.process(raw(1)).await.unwrap();

        assert_eq!(outcome, PostingOutcome::LostRace);
        assert!(!outcome.is_new());
        assert_eq!(channel.calls.load(Ordering::SeqCst), 0);
        assert!(repo.marked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_success_marks_sent_once() {
        let repo = Arc::new(ScriptedRepository::default());
        let coord = coordinator(
            repo.clone(),
            vec![
                dyn_channel(&StubChannel::new("telegram", false)),
                dyn_channel(&StubChannel::new("email", true)),
            ],
        );

        let outcome = coord.process(raw(1)).await.unwrap();

        assert_eq!(outcome, PostingOutcome::Delivered);
        let marked = repo.marked.lock().unwrap();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].1, MULTI_CHANNEL_METHOD);
        let failed = repo.failed.lock().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, "telegram");
    }

    #[tokio::test]
    async fn test_all_channels_fail_never_marks_sent() {
        let repo = Arc::new(ScriptedRepository::default());
        let a = StubChannel::new("telegram", false);
        let b = StubChannel::new("email", false);
        let coord = coordinator(repo.clone(), vec![dyn_channel(&a), dyn_channel(&b)]);

        let outcome = coord.process(raw(1)).await.unwrap();

        assert_eq!(outcome, PostingOutcome::Undelivered);
        assert!(repo.marked.lock().unwrap().is_empty());
        assert_eq!(repo.failed.lock().unwrap().len(), 2);
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delivered_posting_is_marked_before_failure_log_fault() {
        let repo = Arc::new(ScriptedRepository {
            fault_on_failed_attempt: true,
            ..Default::default()
        });
        let telegram = StubChannel::new("telegram", true);
        let email = StubChannel::new("email", false);
        let coord = coordinator(
            repo.clone(),
            vec![dyn_channel(&telegram), dyn_channel(&email)],
        );

        let err = coord.process(raw(1)).await.unwrap_err();

        assert!(err.is_storage_fault());
        let marked = repo.marked.lock().unwrap();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].1, MULTI_CHANNEL_METHOD);
        assert_eq!(email.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_storage_fault_aborts_cycle() {
        let repo = Arc::new(ScriptedRepository {
            fault_after_adds: Some(2),
            ..Default::default()
        });
        let channel = StubChannel::new("telegram", true);
        let coord = coordinator(repo.clone(), vec![dyn_channel(&channel)]);

        let err = coord
            .run_checking_cycle(&[], (0..5).map(raw).collect())
            .await
            .unwrap_err();

        assert!(err.is_storage_fault());
        // Two postings went through before the fault; the rest were not attempted.
        assert_eq!(channel.calls.load(Ordering::SeqCst), 2);
        assert_eq!(repo.adds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_channels_leaves_posting_pending() {
        let repo = Arc::new(ScriptedRepository::default());
        let coord = coordinator(repo.clone(), vec![]);

        let summary = coord
            .run_checking_cycle(&["intern".to_string()], vec![raw(1), raw(2)])
            .await
            .unwrap();

        assert_eq!(
            summary,
            CycleSummary {
                new_count: 2,
                sent_count: 0,
                total_count: 2
            }
        );
        assert!(repo.marked.lock().unwrap().is_empty());
    }
}
