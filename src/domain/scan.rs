//! Scan jobs and the per-site subtask state machine.
//!
//! A [`SiteSubtask`] moves `Pending -> Processing -> {Completed, Failed}`,
//! or directly `Pending -> Failed` when the job is cancelled before a worker
//! picks it up. Terminal states are final. Progress is clamped to `[0, 100]`,
//! never decreases, and reaches 100 exactly when the subtask completes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{JobId, SiteId};

/// Highest progress value a subtask can report before it completes.
const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// Lifecycle state of a single site's portion of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SubtaskStatus {
    /// Returns `true` for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Rejected subtask state transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal transition for site {site_id}: {from} -> {to}")]
pub struct TransitionError {
    pub site_id: SiteId,
    pub from: SubtaskStatus,
    pub to: SubtaskStatus,
}

/// Progress record for one site within a scan job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSubtask {
    pub site_id: SiteId,
    pub site_name: String,
    pub status: SubtaskStatus,
    pub progress: u8,
    pub cards_found: u32,
    pub cards_processed: u32,
    pub cards_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SiteSubtask {
    /// Create a pending subtask expecting `cards_count` buylist lines.
    pub fn new(site_id: SiteId, site_name: impl Into<String>, cards_count: u32) -> Self {
        Self {
            site_id,
            site_name: site_name.into(),
            status: SubtaskStatus::Pending,
            progress: 0,
            cards_found: 0,
            cards_processed: 0,
            cards_count,
            error: None,
        }
    }

    fn reject(&self, to: SubtaskStatus) -> TransitionError {
        TransitionError {
            site_id: self.site_id.clone(),
            from: self.status,
            to,
        }
    }

    /// A worker picked the subtask up.
    ///
    /// # Errors
    ///
    /// Fails unless the subtask is `Pending`.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.status != SubtaskStatus::Pending {
            return Err(self.reject(SubtaskStatus::Processing));
        }
        self.status = SubtaskStatus::Processing;
        Ok(())
    }

    /// Apply an incremental progress report from the fetcher.
    ///
    /// Progress is derived from `processed / count`, capped below 100 while
    /// in flight and never moves backwards.
    ///
    /// # Errors
    ///
    /// Fails unless the subtask is `Processing`.
    pub fn record_progress(&mut self, processed: u32, count: u32) -> Result<(), TransitionError> {
        if self.status != SubtaskStatus::Processing {
            return Err(self.reject(SubtaskStatus::Processing));
        }
        if count > 0 && count >= self.cards_processed {
            self.cards_count = count;
        }
        self.cards_processed = self.cards_processed.max(processed.min(self.cards_count));

        let pct = if self.cards_count == 0 {
            0
        } else {
            u64::from(self.cards_processed) * 100 / u64::from(self.cards_count)
        };
        let pct = u8::try_from(pct.min(u64::from(MAX_IN_FLIGHT_PROGRESS)))
            .unwrap_or(MAX_IN_FLIGHT_PROGRESS);
        self.progress = self.progress.max(pct);
        Ok(())
    }

    /// The fetch succeeded.
    ///
    /// # Errors
    ///
    /// Fails unless the subtask is `Processing`.
    pub fn complete(&mut self, cards_found: u32) -> Result<(), TransitionError> {
        if self.status != SubtaskStatus::Processing {
            return Err(self.reject(SubtaskStatus::Completed));
        }
        self.status = SubtaskStatus::Completed;
        self.cards_found = cards_found;
        self.cards_processed = self.cards_count;
        self.progress = 100;
        Ok(())
    }

    /// The fetch failed, timed out, or the job was cancelled.
    ///
    /// # Errors
    ///
    /// Fails if the subtask is already terminal.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(self.reject(SubtaskStatus::Failed));
        }
        self.status = SubtaskStatus::Failed;
        self.error = Some(error.into());
        Ok(())
    }
}

/// Aggregate job state, derived from the subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
}

/// Snapshot of one scan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub subtasks: Vec<SiteSubtask>,
    #[serde(default)]
    pub cancelled: bool,
}

impl ScanJob {
    /// Create a job with one pending subtask per site.
    #[must_use]
    pub fn new(id: JobId, subtasks: Vec<SiteSubtask>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            subtasks,
            cancelled: false,
        }
    }

    /// Overall status.
    ///
    /// `Completed` iff every subtask is terminal (a job without sites is
    /// complete immediately).
    #[must_use]
    pub fn status(&self) -> ScanStatus {
        if self.is_complete() {
            ScanStatus::Completed
        } else if self
            .subtasks
            .iter()
            .all(|s| s.status == SubtaskStatus::Pending)
        {
            ScanStatus::Pending
        } else {
            ScanStatus::Running
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.subtasks.iter().all(|s| s.status.is_terminal())
    }

    #[must_use]
    pub fn subtask(&self, site_id: &SiteId) -> Option<&SiteSubtask> {
        self.subtasks.iter().find(|s| &s.site_id == site_id)
    }

    pub fn subtask_mut(&mut self, site_id: &SiteId) -> Option<&mut SiteSubtask> {
        self.subtasks.iter_mut().find(|s| &s.site_id == site_id)
    }

    /// Number of subtasks in the given state.
    #[must_use]
    pub fn count(&self, status: SubtaskStatus) -> usize {
        self.subtasks.iter().filter(|s| s.status == status).count()
    }

    /// Mean subtask progress, 0-100.
    #[must_use]
    pub fn overall_progress(&self) -> u8 {
        if self.subtasks.is_empty() {
            return 100;
        }
        let total: u32 = self.subtasks.iter().map(|s| u32::from(s.progress)).sum();
        (total / self.subtasks.len() as u32) as u8
    }
}

/// Wire view of a job with its derived status flattened in.
#[derive(Debug, Clone, Serialize)]
pub struct ScanJobView<'a> {
    pub job_id: JobId,
    pub status: ScanStatus,
    pub progress: u8,
    pub completed_sites: usize,
    pub failed_sites: usize,
    #[serde(flatten)]
    pub job: &'a ScanJob,
}

impl<'a> From<&'a ScanJob> for ScanJobView<'a> {
    fn from(job: &'a ScanJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status(),
            progress: job.overall_progress(),
            completed_sites: job.count(SubtaskStatus::Completed),
            failed_sites: job.count(SubtaskStatus::Failed),
            job,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtask(count: u32) -> SiteSubtask {
        SiteSubtask::new(SiteId::from("s1"), "Site One", count)
    }

    #[test]
    fn happy_path_reaches_full_progress() {
        let mut s = subtask(4);
        s.start().unwrap();
        s.record_progress(2, 4).unwrap();
        assert_eq!(s.progress, 50);
        s.complete(3).unwrap();
        assert_eq!(s.status, SubtaskStatus::Completed);
        assert_eq!(s.progress, 100);
        assert_eq!(s.cards_found, 3);
        assert_eq!(s.cards_processed, 4);
    }

    #[test]
    fn progress_never_reaches_100_before_completion() {
        let mut s = subtask(4);
        s.start().unwrap();
        s.record_progress(4, 4).unwrap();
        assert_eq!(s.progress, MAX_IN_FLIGHT_PROGRESS);
        assert_eq!(s.status, SubtaskStatus::Processing);
    }

    #[test]
    fn progress_is_monotonic() {
        let mut s = subtask(10);
        s.start().unwrap();
        s.record_progress(7, 10).unwrap();
        s.record_progress(3, 10).unwrap();
        assert_eq!(s.progress, 70);
        assert_eq!(s.cards_processed, 7);
    }

    #[test]
    fn shrinking_count_below_processed_is_ignored() {
        let mut s = subtask(10);
        s.start().unwrap();
        s.record_progress(7, 10).unwrap();
        s.record_progress(0, 2).unwrap();
        assert_eq!(s.cards_count, 10);
        assert_eq!(s.cards_processed, 7);
        assert_eq!(s.progress, 70);

        s.record_progress(9, 10).unwrap();
        assert_eq!(s.progress, 90);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut s = subtask(1);
        s.start().unwrap();
        s.complete(1).unwrap();
        assert!(s.fail("late").is_err());
        assert!(s.start().is_err());
        assert!(s.record_progress(1, 1).is_err());

        let mut f = subtask(1);
        f.fail("cancelled").unwrap();
        assert!(f.start().is_err());
        assert!(f.complete(0).is_err());
        assert_eq!(f.error.as_deref(), Some("cancelled"));
    }

    #[test]
    fn cannot_complete_from_pending() {
        let mut s = subtask(1);
        let err = s.complete(0).unwrap_err();
        assert_eq!(err.from, SubtaskStatus::Pending);
        assert_eq!(err.to, SubtaskStatus::Completed);
    }

    #[test]
    fn job_status_is_derived_from_subtasks() {
        let mut job = ScanJob::new(
            JobId::generate(),
            vec![
                SiteSubtask::new(SiteId::from("a"), "A", 1),
                SiteSubtask::new(SiteId::from("b"), "B", 1),
            ],
        );
        assert_eq!(job.status(), ScanStatus::Pending);

        let a = job.subtask_mut(&SiteId::from("a")).unwrap();
        a.start().unwrap();
        assert_eq!(job.status(), ScanStatus::Running);

        job.subtask_mut(&SiteId::from("a")).unwrap().complete(1).unwrap();
        job.subtask_mut(&SiteId::from("b")).unwrap().fail("down").unwrap();
        assert_eq!(job.status(), ScanStatus::Completed);
        assert_eq!(job.count(SubtaskStatus::Failed), 1);
    }

    #[test]
    fn empty_job_is_complete() {
        let job = ScanJob::new(JobId::generate(), vec![]);
        assert!(job.is_complete());
        assert_eq!(job.overall_progress(), 100);
    }
}
