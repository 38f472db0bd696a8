//! Remote-to-local reconciliation.
//!
//! The reconciler pulls remote truth through the
//! [`RemoteJobs`](sora_core::RemoteJobs) seam and merges it into the
//! [`JobStore`], publishing transition notifications when a merge
//! resolves a job. It is the only component that issues network calls
//! on the store's behalf.

use std::sync::Arc;

use sora_core::defaults::LIST_PAGE_LIMIT;
use sora_core::{ListQuery, RemoteJobs, SoraError};
use sora_events::StudioEvent;

use crate::store::JobStore;

/// Merges remote job state into the local store.
pub struct Reconciler {
    store: Arc<JobStore>,
    remote: Arc<dyn RemoteJobs>,
}

impl Reconciler {
    pub fn new(store: Arc<JobStore>, remote: Arc<dyn RemoteJobs>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Fetch one job from the remote API and merge it in.
    ///
    /// When the merge moves the record into `completed` or `failed`, a
    /// transition notification is published in addition to the render
    /// notification the upsert itself produces.
    pub async fn reconcile_one(&self, id: &str) -> Result<(), SoraError> {
        let remote = self.remote.retrieve(id).await?;
        let failure_message = remote.error.as_ref().and_then(|e| e.message.clone());

        if let Some(change) = self.store.upsert(remote) {
            tracing::debug!(
                id,
                before = change.before.label(),
                after = change.after.label(),
                "Reconciled job"
            );
            if change.entered_completed() {
                self.store
                    .events()
                    .publish(StudioEvent::JobCompleted { id: id.to_string() });
            } else if change.entered_failed() {
                self.store.events().publish(StudioEvent::JobFailed {
                    id: id.to_string(),
                    message: failure_message,
                });
            }
        }
        Ok(())
    }

    /// Fetch the newest page of remote jobs and merge every record,
    /// then restore newest-first display order.
    ///
    /// Used for manual refresh and startup catch-up. Merges here fire
    /// no transition notifications; those are the poll cycle's job.
    pub async fn reconcile_all(&self) -> Result<(), SoraError> {
        let page = self
            .remote
            .list(ListQuery::newest_page(LIST_PAGE_LIMIT))
            .await?;

        tracing::debug!(count = page.len(), "Merging remote job listing");
        for job in page {
            self.store.upsert(job);
        }
        self.store.sort_by_created_desc();
        Ok(())
    }

    /// One scheduled unit of polling work.
    ///
    /// Reconciles every active record concurrently. An empty active set
    /// issues no network calls at all. Per-record failures are logged
    /// and isolated: one bad record never aborts the rest of the
    /// batch. A single consolidated render notification follows the
    /// whole batch.
    pub async fn poll_cycle(&self) {
        let active = self.store.active_ids();
        if active.is_empty() {
            return;
        }

        tracing::debug!(active = active.len(), "Polling active jobs");

        let results =
            futures::future::join_all(active.iter().map(|id| self.reconcile_one(id))).await;

        for (id, result) in active.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(id, kind = e.kind(), error = %e, "Failed to reconcile job");
            }
        }

        self.store.notify_changed();
    }

    /// Delete a job, remote first, local always.
    ///
    /// Remote deletion is best-effort: the local record is removed even
    /// when the remote call fails, so the display never gets stuck on
    /// an orphaned record. The remote error is still returned (after
    /// local removal) for user-facing notification.
    pub async fn delete_job(&self, id: &str) -> Result<(), SoraError> {
        let remote_result = self.remote.remove(id).await;

        if let Err(e) = &remote_result {
            tracing::warn!(id, error = %e, "Remote deletion failed, removing locally anyway");
        }
        self.store.remove_local(id);

        remote_result
    }
}
