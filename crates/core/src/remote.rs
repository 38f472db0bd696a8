//! The seam between the reconciler and the remote video API.
//!
//! The store never talks HTTP directly; it drives a [`RemoteJobs`]
//! implementation. Production code plugs in the reqwest gateway, tests
//! plug in an in-memory fake.

use async_trait::async_trait;

use crate::error::SoraError;
use crate::job::VideoJob;

/// Listing order for [`RemoteJobs::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters for a remote listing. Absent fields are omitted
/// from the request entirely rather than sent as empty values.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Cursor: return jobs created after this id.
    pub after: Option<String>,
    /// Maximum number of jobs to return.
    pub limit: Option<u32>,
    pub order: Option<SortOrder>,
}

impl ListQuery {
    /// The query used by a full reconciliation: newest first, one
    /// bounded page.
    pub fn newest_page(limit: u32) -> Self {
        Self {
            after: None,
            limit: Some(limit),
            order: Some(SortOrder::Desc),
        }
    }

    /// Render the present fields as query pairs, in wire order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        pairs
    }
}

/// Remote operations the reconciler needs. A deliberately narrow view
/// of the gateway: submission, remix, and content retrieval stay
/// caller-driven and never run inside a poll cycle.
#[async_trait]
pub trait RemoteJobs: Send + Sync {
    /// Fetch the current remote record for one job.
    async fn retrieve(&self, id: &str) -> Result<VideoJob, SoraError>;

    /// Fetch a page of remote records.
    async fn list(&self, query: ListQuery) -> Result<Vec<VideoJob>, SoraError>;

    /// Request remote deletion of one job.
    async fn remove(&self, id: &str) -> Result<(), SoraError>;
}
