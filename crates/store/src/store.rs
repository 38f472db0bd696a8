//! The authoritative local job list.
//!
//! One [`JobStore`] instance exists per process, shared via `Arc`. All
//! mutations are synchronous with respect to each other: the inner
//! mutex is never held across an await point, every mutation rewrites
//! the persisted file, and every mutation publishes a
//! [`StudioEvent::JobsChanged`] render notification.

use std::sync::Mutex;

use sora_core::{JobStatus, VideoJob};
use sora_events::{EventBus, StudioEvent};

use crate::persistence::JobsFileStore;

/// Status pair returned by [`JobStore::upsert`] for a record that
/// already existed: status before and after the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub before: JobStatus,
    pub after: JobStatus,
}

impl StatusChange {
    /// The merge moved the record into `completed`.
    pub fn entered_completed(self) -> bool {
        self.before != JobStatus::Completed && self.after == JobStatus::Completed
    }

    /// The merge moved the record into `failed`.
    pub fn entered_failed(self) -> bool {
        self.before != JobStatus::Failed && self.after == JobStatus::Failed
    }
}

/// Locally persisted list of [`VideoJob`]s, keyed by id.
///
/// The store is the sole source of truth for what a front end
/// displays. Remote truth flows in through
/// [`upsert`](JobStore::upsert); records leave only through explicit
/// local deletion.
pub struct JobStore {
    jobs: Mutex<Vec<VideoJob>>,
    file: JobsFileStore,
    events: EventBus,
}

impl JobStore {
    /// Open the store, loading any persisted list from `file`.
    pub fn open(file: JobsFileStore, events: EventBus) -> Self {
        let jobs = file.load();
        tracing::info!(count = jobs.len(), path = %file.path().display(), "Job store loaded");
        Self {
            jobs: Mutex::new(jobs),
            file,
            events,
        }
    }

    /// The notification bus this store publishes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Snapshot of the full list, in display order.
    pub fn jobs(&self) -> Vec<VideoJob> {
        self.jobs.lock().expect("job list lock poisoned").clone()
    }

    /// Snapshot of one record.
    pub fn get(&self, id: &str) -> Option<VideoJob> {
        self.jobs
            .lock()
            .expect("job list lock poisoned")
            .iter()
            .find(|j| j.id == id)
            .cloned()
    }

    /// Ids of every record still being worked on remotely. This is the
    /// poll set: terminal and unknown statuses are excluded.
    pub fn active_ids(&self) -> Vec<String> {
        self.jobs
            .lock()
            .expect("job list lock poisoned")
            .iter()
            .filter(|j| j.status.is_active())
            .map(|j| j.id.clone())
            .collect()
    }

    /// Snapshot of every completed record (the gallery source).
    pub fn completed_jobs(&self) -> Vec<VideoJob> {
        self.jobs
            .lock()
            .expect("job list lock poisoned")
            .iter()
            .filter(|j| j.status == JobStatus::Completed)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job list lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Front-insert a freshly submitted or remixed job.
    ///
    /// The record carries the locally supplied prompt, which stays
    /// authoritative through all later merges.
    pub fn insert_new(&self, job: VideoJob) {
        {
            let mut jobs = self.jobs.lock().expect("job list lock poisoned");
            jobs.insert(0, job);
            self.persist(&jobs);
        }
        self.events.publish(StudioEvent::JobsChanged);
    }

    /// Merge a remote record into the list by id, inserting it when
    /// unseen.
    ///
    /// Returns the before/after status pair when the record already
    /// existed, `None` on first observation. Always persists and
    /// always publishes a render notification.
    pub fn upsert(&self, remote: VideoJob) -> Option<StatusChange> {
        let change = {
            let mut jobs = self.jobs.lock().expect("job list lock poisoned");
            let change = match jobs.iter_mut().find(|j| j.id == remote.id) {
                Some(existing) => {
                    let before = existing.status;
                    existing.merge_remote(remote);
                    Some(StatusChange {
                        before,
                        after: existing.status,
                    })
                }
                None => {
                    jobs.push(remote);
                    None
                }
            };
            self.persist(&jobs);
            change
        };
        self.events.publish(StudioEvent::JobsChanged);
        change
    }

    /// Delete a record from the local list.
    ///
    /// Local only: remote deletion is the reconciler's concern. Returns
    /// whether a record was actually removed.
    pub fn remove_local(&self, id: &str) -> bool {
        let removed = {
            let mut jobs = self.jobs.lock().expect("job list lock poisoned");
            let before = jobs.len();
            jobs.retain(|j| j.id != id);
            let removed = jobs.len() != before;
            if removed {
                self.persist(&jobs);
            }
            removed
        };
        if removed {
            self.events.publish(StudioEvent::JobsChanged);
        }
        removed
    }

    /// Stable sort, newest first. Records without a creation timestamp
    /// sort last; ties keep their existing relative order.
    pub fn sort_by_created_desc(&self) {
        {
            let mut jobs = self.jobs.lock().expect("job list lock poisoned");
            jobs.sort_by(|a, b| {
                let a_ts = a.created_at.map(|t| t.timestamp()).unwrap_or(i64::MIN);
                let b_ts = b.created_at.map(|t| t.timestamp()).unwrap_or(i64::MIN);
                b_ts.cmp(&a_ts)
            });
            self.persist(&jobs);
        }
        self.events.publish(StudioEvent::JobsChanged);
    }

    /// Publish a render notification without mutating the list. Used
    /// by the poll cycle for its consolidated end-of-batch signal.
    pub fn notify_changed(&self) {
        self.events.publish(StudioEvent::JobsChanged);
    }

    /// Rewrite the persisted file from the current list.
    ///
    /// Best-effort: a storage failure is logged, not propagated, so a
    /// flaky disk cannot wedge reconciliation.
    fn persist(&self, jobs: &[VideoJob]) {
        if let Err(e) = self.file.save(jobs) {
            tracing::error!(path = %self.file.path().display(), error = %e, "Failed to persist job list");
        }
    }
}
