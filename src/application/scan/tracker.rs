//! Subtask tracker: the single writer of one scan job.
//!
//! Site workers never touch the [`ScanJob`] directly. They post
//! [`TrackerEvent`]s to a channel; the tracker task applies them in order
//! through the subtask state machine and publishes an immutable snapshot
//! after every change. Status readers clone the latest snapshot from a
//! `watch` channel without locking the writer.
//!
//! ```text
//! worker(site a) --+
//! worker(site b) --+--(mpsc)--> SubtaskTracker --(watch)--> get_status()
//! cancel()       --+                 |
//!                                    +--> ListingAggregator (on completion)
//! ```

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::application::aggregate::ListingAggregator;
use crate::domain::{
    BuylistCard, CandidatePool, JobId, MarketplaceListing, ScanJob, SiteId, SubtaskStatus,
};
use crate::error::ScanError;
use crate::port::ProgressSink;

/// Message from a site worker (or `cancel`) to the tracker.
#[derive(Debug)]
pub enum TrackerEvent {
    /// The worker acquired a slot and is about to fetch.
    Started { site_id: SiteId },
    /// Incremental progress from the fetcher.
    Progress {
        site_id: SiteId,
        processed: u32,
        total: u32,
    },
    /// The fetch succeeded.
    Completed {
        site_id: SiteId,
        listings: Vec<MarketplaceListing>,
    },
    /// The fetch failed or timed out.
    Failed { site_id: SiteId, error: ScanError },
    /// Fail every subtask that has not started yet.
    Cancel,
}

/// Results published once when the job completes.
#[derive(Debug, Default)]
pub struct JobOutcome {
    candidates: OnceLock<Arc<CandidatePool>>,
    finished_at: OnceLock<Instant>,
}

impl JobOutcome {
    /// Candidate pool, available once every subtask is terminal.
    #[must_use]
    pub fn candidates(&self) -> Option<Arc<CandidatePool>> {
        self.candidates.get().cloned()
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }
}

/// Progress sink that forwards reports to the tracker.
///
/// Reports are dropped when the channel is full; a later report or the
/// terminal event supersedes them.
pub struct ChannelProgress {
    site_id: SiteId,
    tx: mpsc::Sender<TrackerEvent>,
}

impl ChannelProgress {
    #[must_use]
    pub fn new(site_id: SiteId, tx: mpsc::Sender<TrackerEvent>) -> Self {
        Self { site_id, tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, processed: u32, total: u32) {
        let _ = self.tx.try_send(TrackerEvent::Progress {
            site_id: self.site_id.clone(),
            processed,
            total,
        });
    }
}

/// Owner of one job's subtask state.
pub struct SubtaskTracker {
    job: ScanJob,
    buylist: Arc<[BuylistCard]>,
    aggregator: ListingAggregator,
    listings: Vec<(SiteId, Vec<MarketplaceListing>)>,
    snapshot: watch::Sender<ScanJob>,
    outcome: Arc<JobOutcome>,
}

impl SubtaskTracker {
    /// Create a tracker plus the handles readers use.
    #[must_use]
    pub fn new(
        job: ScanJob,
        buylist: Arc<[BuylistCard]>,
        aggregator: ListingAggregator,
    ) -> (Self, watch::Receiver<ScanJob>, Arc<JobOutcome>) {
        let (snapshot, rx) = watch::channel(job.clone());
        let outcome = Arc::new(JobOutcome::default());
        let tracker = Self {
            job,
            buylist,
            aggregator,
            listings: Vec::new(),
            snapshot,
            outcome: Arc::clone(&outcome),
        };
        (tracker, rx, outcome)
    }

    fn job_id(&self) -> JobId {
        self.job.id
    }

    /// Apply one event. Returns `true` if the job state changed.
    ///
    /// Illegal transitions are logged and ignored.
    pub fn apply(&mut self, event: TrackerEvent) -> bool {
        let job_id = self.job_id();
        if let TrackerEvent::Cancel = event {
            let mut changed = !std::mem::replace(&mut self.job.cancelled, true);
            for subtask in &mut self.job.subtasks {
                if subtask.status == SubtaskStatus::Pending
                    && subtask.fail(ScanError::Cancelled.to_string()).is_ok()
                {
                    changed = true;
                }
            }
            info!(job_id = %job_id, "Scan cancelled");
            return changed;
        }

        let site_id = match &event {
            TrackerEvent::Started { site_id }
            | TrackerEvent::Progress { site_id, .. }
            | TrackerEvent::Completed { site_id, .. }
            | TrackerEvent::Failed { site_id, .. } => site_id.clone(),
            TrackerEvent::Cancel => return false,
        };
        let Some(subtask) = self.job.subtask_mut(&site_id) else {
            warn!(job_id = %job_id, site_id = %site_id, "Event for unknown site");
            return false;
        };

        let result = match event {
            TrackerEvent::Started { .. } => subtask.start(),
            TrackerEvent::Progress {
                processed, total, ..
            } => subtask.record_progress(processed, total),
            TrackerEvent::Completed { listings, .. } => {
                let found = u32::try_from(listings.len()).unwrap_or(u32::MAX);
                let result = subtask.complete(found);
                if result.is_ok() {
                    info!(job_id = %job_id, site_id = %site_id, cards_found = found, "Site scan completed");
                    self.listings.push((site_id.clone(), listings));
                }
                result
            }
            TrackerEvent::Failed { error, .. } => {
                let result = subtask.fail(error.to_string());
                if result.is_ok() {
                    warn!(job_id = %job_id, site_id = %site_id, error = %error, "Site scan failed");
                }
                result
            }
            TrackerEvent::Cancel => return false,
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                debug!(job_id = %job_id, error = %err, "Ignoring illegal subtask transition");
                false
            }
        }
    }

    /// Consume events until every subtask is terminal.
    pub async fn run(mut self, mut events: mpsc::Receiver<TrackerEvent>) {
        if self.job.is_complete() {
            self.finish();
            return;
        }
        while let Some(event) = events.recv().await {
            if !self.apply(event) {
                continue;
            }
            if self.job.is_complete() {
                self.finish();
                return;
            }
            self.snapshot.send_replace(self.job.clone());
        }
        warn!(job_id = %self.job_id(), "Tracker channel closed before the job completed");
    }

    fn finish(&mut self) {
        let listings = std::mem::take(&mut self.listings);
        let pool = self.aggregator.aggregate(&self.buylist, listings);
        info!(
            job_id = %self.job_id(),
            listings = pool.listings().len(),
            unfulfillable = pool.unfulfillable().len(),
            "Scan job completed"
        );
        let _ = self.outcome.candidates.set(Arc::new(pool));
        let _ = self.outcome.finished_at.set(Instant::now());
        // Publish last so readers observing completion also see the pool.
        self.snapshot.send_replace(self.job.clone());
    }
}
