//! Scan orchestrator.
//!
//! Fans a buylist out to every selected site. Each site runs as its own task
//! bounded by a process-wide semaphore; excess sites wait in `pending` until
//! a slot frees. Each job gets a [`SubtaskTracker`] task as its single
//! writer, and the orchestrator keeps only read handles in its registry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ScanConfig;
use super::tracker::{ChannelProgress, JobOutcome, SubtaskTracker, TrackerEvent};
use crate::adapter::outbound::fetch::FetcherRegistry;
use crate::application::aggregate::ListingAggregator;
use crate::domain::card::validate_buylist;
use crate::domain::{
    BuylistCard, CandidatePool, JobId, MarketplaceListing, ScanJob, SiteDescriptor, SiteId,
    SiteSubtask,
};
use crate::error::{Error, Result, ScanError};
use crate::port::SiteFetcher;

/// Read handles for one job.
struct JobEntry {
    snapshot: watch::Receiver<ScanJob>,
    events: mpsc::Sender<TrackerEvent>,
    cancel: CancellationToken,
    outcome: Arc<JobOutcome>,
}

/// Everything a site worker needs.
struct SiteWork {
    site: SiteDescriptor,
    buylist: Arc<[BuylistCard]>,
    fetcher: Option<Arc<dyn SiteFetcher>>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    events: mpsc::Sender<TrackerEvent>,
    timeout: Duration,
}

/// Parallel, partial-failure-tolerant scan fan-out.
pub struct ScanOrchestrator {
    fetchers: FetcherRegistry,
    aggregator: ListingAggregator,
    config: ScanConfig,
    permits: Arc<Semaphore>,
    jobs: DashMap<JobId, JobEntry>,
}

impl ScanOrchestrator {
    #[must_use]
    pub fn new(fetchers: FetcherRegistry, aggregator: ListingAggregator, config: ScanConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        Self {
            fetchers,
            aggregator,
            config,
            permits,
            jobs: DashMap::new(),
        }
    }

    /// Start scanning `sites` for `buylist` and return the job id.
    ///
    /// Inactive and not-working sites are skipped; duplicate ids are scanned
    /// once. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed buylist line.
    pub fn start_scan(&self, buylist: Vec<BuylistCard>, sites: Vec<SiteDescriptor>) -> Result<JobId> {
        validate_buylist(&buylist)?;
        self.prune_finished();

        let mut seen = HashSet::new();
        let sites: Vec<SiteDescriptor> = sites
            .into_iter()
            .filter(SiteDescriptor::is_scannable)
            .filter(|s| seen.insert(s.id.clone()))
            .collect();

        let job_id = JobId::generate();
        let cards_count = u32::try_from(buylist.len()).unwrap_or(u32::MAX);
        let subtasks = sites
            .iter()
            .map(|s| SiteSubtask::new(s.id.clone(), s.name.clone(), cards_count))
            .collect();
        let job = ScanJob::new(job_id, subtasks);

        let buylist: Arc<[BuylistCard]> = buylist.into();
        let (tracker, snapshot, outcome) =
            SubtaskTracker::new(job, Arc::clone(&buylist), self.aggregator);
        let (events, events_rx) = mpsc::channel(self.config.progress_channel_capacity.max(1));
        let cancel = CancellationToken::new();

        info!(job_id = %job_id, sites = sites.len(), cards = buylist.len(), "Starting scan");
        tokio::spawn(tracker.run(events_rx));

        for site in sites {
            let fetcher = self.fetchers.get(site.parse_method);
            tokio::spawn(run_site(SiteWork {
                site,
                buylist: Arc::clone(&buylist),
                fetcher,
                permits: Arc::clone(&self.permits),
                cancel: cancel.clone(),
                events: events.clone(),
                timeout: self.config.fetch_timeout(),
            }));
        }

        self.jobs.insert(
            job_id,
            JobEntry {
                snapshot,
                events,
                cancel,
                outcome,
            },
        );
        Ok(job_id)
    }

    /// Latest snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown or pruned jobs.
    pub fn get_status(&self, job_id: JobId) -> Result<ScanJob> {
        let entry = self.entry(job_id)?;
        let job = entry.snapshot.borrow().clone();
        Ok(job)
    }

    /// Stop scheduling new work for a job.
    ///
    /// Unstarted sites fail with a cancellation error; in-flight fetches run
    /// to completion or timeout. Cancelling a finished job is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown or pruned jobs.
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        let (events, token) = {
            let entry = self.entry(job_id)?;
            (entry.events.clone(), entry.cancel.clone())
        };
        token.cancel();
        if events.send(TrackerEvent::Cancel).await.is_err() {
            debug!(job_id = %job_id, "Cancel after completion ignored");
        }
        Ok(())
    }

    /// Resolve once every subtask is terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown or pruned jobs.
    pub async fn wait_for_completion(&self, job_id: JobId) -> Result<ScanJob> {
        let mut rx = self.entry(job_id)?.snapshot.clone();
        if let Ok(job) = rx.wait_for(ScanJob::is_complete).await {
            return Ok(job.clone());
        }
        // Tracker gone: the last published snapshot is final.
        let job = rx.borrow().clone();
        Ok(job)
    }

    /// Aggregated candidate pool, `None` while the job is still running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown or pruned jobs.
    pub fn candidates(&self, job_id: JobId) -> Result<Option<Arc<CandidatePool>>> {
        Ok(self.entry(job_id)?.outcome.candidates())
    }

    /// Drop finished jobs older than the retention window.
    ///
    /// Returns the number of jobs removed.
    pub fn prune_finished(&self) -> usize {
        let retention = self.config.job_retention();
        let now = Instant::now();
        let before = self.jobs.len();
        self.jobs.retain(|_, entry| {
            entry
                .outcome
                .finished_at()
                .map_or(true, |at| now.duration_since(at) < retention)
        });
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            debug!(removed, "Pruned finished scan jobs");
        }
        removed
    }

    /// Number of jobs currently held.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn entry(
        &self,
        job_id: JobId,
    ) -> Result<dashmap::mapref::one::Ref<'_, JobId, JobEntry>> {
        self.jobs.get(&job_id).ok_or_else(|| Error::NotFound {
            entity: "scan job",
            id: job_id.to_string(),
        })
    }
}

/// One site's unit of work.
async fn run_site(work: SiteWork) {
    let SiteWork {
        site,
        buylist,
        fetcher,
        permits,
        cancel,
        events,
        timeout,
    } = work;

    let _permit = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return,
        },
    };
    let site_id = site.id.clone();
    if !announce_start(&site_id, &cancel, &events).await {
        return;
    }

    let result = match fetcher {
        None => Err(ScanError::NoFetcher(site.parse_method.as_str().to_string())),
        Some(fetcher) => fetch_isolated(fetcher, site, buylist, events.clone(), timeout).await,
    };

    let event = match result {
        Ok(listings) => TrackerEvent::Completed {
            site_id,
            listings,
        },
        Err(error) => TrackerEvent::Failed { site_id, error },
    };
    let _ = events.send(event).await;
}

/// Move the site to processing. Returns `false` when no fetch may run.
///
/// A cancel can land between the slot being acquired and `Started` reaching
/// the tracker. The token is checked again once `Started` is queued; the
/// trailing `Failed` is ignored if the tracker already failed the site.
async fn announce_start(
    site_id: &SiteId,
    cancel: &CancellationToken,
    events: &mpsc::Sender<TrackerEvent>,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let started = TrackerEvent::Started {
        site_id: site_id.clone(),
    };
    if events.send(started).await.is_err() {
        return false;
    }
    if cancel.is_cancelled() {
        let _ = events
            .send(TrackerEvent::Failed {
                site_id: site_id.clone(),
                error: ScanError::Cancelled,
            })
            .await;
        return false;
    }
    true
}

/// Run the fetch on its own task so a panicking fetcher only fails its site.
async fn fetch_isolated(
    fetcher: Arc<dyn SiteFetcher>,
    site: SiteDescriptor,
    buylist: Arc<[BuylistCard]>,
    events: mpsc::Sender<TrackerEvent>,
    timeout: Duration,
) -> std::result::Result<Vec<MarketplaceListing>, ScanError> {
    let site_id = site.id.clone();
    let mut handle = tokio::spawn(async move {
        let progress = ChannelProgress::new(site.id.clone(), events);
        fetcher.fetch(&site, &buylist, &progress).await
    });

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            warn!(site_id = %site_id, error = %join_err, "Fetcher task crashed");
            Err(ScanError::ParseError(format!("fetcher crashed: {join_err}")))
        }
        Err(_) => {
            handle.abort();
            Err(ScanError::ScanTimeout(timeout))
        }
    }
}
