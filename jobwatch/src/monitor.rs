//! Outer driver: fetch, run a checking cycle, report, wait, repeat.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::Result;
use crate::coordinator::{CycleSummary, DeliveryCoordinator};
use crate::domain::DeliveryStatus;
use crate::sources::SourceSet;

/// Result of one checking cycle plus the store totals read after it.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub counts_by_status: HashMap<DeliveryStatus, u64>,
    pub pending: usize,
}

impl CycleReport {
    /// Postings in the store, whatever their status.
    pub fn stored_total(&self) -> u64 {
        self.counts_by_status.values().sum()
    }
}

/// Totals over the life of one monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub checks: u64,
    pub failed_checks: u64,
    pub postings_seen: u64,
    pub new_postings: u64,
    pub notifications_sent: u64,
}

impl MonitorStats {
    fn record(&mut self, summary: &CycleSummary) {
        self.postings_seen += summary.total_count as u64;
        self.new_postings += summary.new_count as u64;
        self.notifications_sent += summary.sent_count as u64;
    }
}

pub struct JobMonitor {
    coordinator: DeliveryCoordinator,
    sources: SourceSet,
    keywords: Vec<String>,
    check_interval: Duration,
    stats: MonitorStats,
}

impl JobMonitor {
    pub fn new(
        coordinator: DeliveryCoordinator,
        sources: SourceSet,
        keywords: Vec<String>,
        check_interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            sources,
            keywords,
            check_interval,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Run a single cycle and read back the store totals.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.stats.checks += 1;

        let raw = self.sources.fetch_all(&self.keywords).await;
        let summary = self
            .coordinator
            .run_checking_cycle(&self.keywords, raw)
            .await?;
        self.stats.record(&summary);

        let repo = self.coordinator.repository();
        let counts_by_status = repo.counts_by_status().await?;
        let pending = repo.pending_postings().await?.len();

        let report = CycleReport {
            summary,
            counts_by_status,
            pending,
        };

        info!(
            check = self.stats.checks,
            observed = summary.total_count,
            new = summary.new_count,
            sent = summary.sent_count,
            stored = report.stored_total(),
            pending = report.pending,
            "Checking cycle complete"
        );

        Ok(report)
    }

    /// Loop until `cancel` fires.
    ///
    /// Storage faults end only the current cycle. Any other error stops the
    /// loop and is returned.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<MonitorStats> {
        info!(
            sources = ?self.sources.names(),
            channels = self.coordinator.channel_count(),
            keywords = self.keywords.len(),
            interval_secs = self.check_interval.as_secs(),
            "Job monitor started"
        );

        let outcome = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }

            match self.run_once().await {
                Ok(_) => {}
                Err(e) if e.is_storage_fault() => {
                    self.stats.failed_checks += 1;
                    error!(error = %e, "Storage fault, abandoning this cycle");
                }
                Err(e) => break Err(e),
            }

            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                _ = tokio::time::sleep(self.check_interval) => {}
            }
        };

        let stats = self.stats;
        info!(
            checks = stats.checks,
            failed_checks = stats.failed_checks,
            postings_seen = stats.postings_seen,
            new_postings = stats.new_postings,
            notifications_sent = stats.notifications_sent,
            "Job monitor stopped"
        );

        outcome.map(|()| stats)
    }
}
