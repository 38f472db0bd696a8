//! Local job store and reconciliation engine.
//!
//! [`JobStore`](store::JobStore) owns the authoritative local list of
//! [`VideoJob`](sora_core::VideoJob)s and persists it across restarts.
//! [`Reconciler`](reconciler::Reconciler) keeps that list converging
//! toward remote truth: single-record and full-page merges, transition
//! detection, and the concurrent poll cycle. [`Poller`](poller::Poller)
//! drives the cycle on a cancellable wall-clock interval.

pub mod persistence;
pub mod poller;
pub mod reconciler;
pub mod settings;
pub mod store;

pub use persistence::JobsFileStore;
pub use poller::Poller;
pub use reconciler::Reconciler;
pub use settings::{Settings, StudioPaths};
pub use store::{JobStore, StatusChange};
