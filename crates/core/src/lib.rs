//! Domain model for the Sora Studio video job pipeline.
//!
//! Defines the [`VideoJob`](job::VideoJob) record and its merge rules,
//! the shared error taxonomy, creation defaults, and the [`RemoteJobs`]
//! trait the reconciler uses to talk to the remote video API.

pub mod defaults;
pub mod error;
pub mod job;
pub mod remote;

pub use error::SoraError;
pub use job::{JobFailure, JobStatus, VideoJob};
pub use remote::{ListQuery, RemoteJobs, SortOrder};
