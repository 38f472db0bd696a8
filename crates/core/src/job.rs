//! The [`VideoJob`] record and its status lifecycle.
//!
//! A `VideoJob` mirrors one remote video generation job. The remote API
//! is the source of truth for everything except `prompt`, which the
//! local side supplied at creation time and which the remote record may
//! omit or reformat. [`VideoJob::merge_remote`] encodes that precedence
//! rule field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status reported by the remote API.
///
/// Observed transitions run `queued → in_progress/processing →
/// {completed | failed | cancelled}`, but nothing here enforces
/// legality: the store accepts whatever the remote reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Processing,
    Completed,
    Failed,
    Cancelled,
    /// Any status string this build does not recognise. Never polled.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// True while the job is still being worked on remotely. Active
    /// jobs are the only ones a poll cycle reconciles.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress | Self::Processing)
    }

    /// True once the job can no longer change status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Human-readable label for display and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in progress",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

/// Structured failure payload attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// One remote video generation job as tracked locally.
///
/// Field names follow the wire format of the `/videos` API; timestamps
/// travel as epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoJob {
    /// Opaque remote-assigned identifier. Store key; never changes.
    pub id: String,

    pub status: JobStatus,

    /// Completion percentage, 0-100. Meaningful only while active.
    #[serde(default)]
    pub progress: u8,

    /// Prompt supplied at creation time. Locally authoritative: the
    /// remote echo may be absent or reformatted.
    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Model the job was created with. Display only.
    #[serde(default)]
    pub model: Option<String>,

    /// Clip length in seconds, echoed back as a string by the API.
    #[serde(default)]
    pub seconds: Option<String>,

    /// Output resolution, e.g. `720x1280`. Display only.
    #[serde(default)]
    pub size: Option<String>,

    /// Present only when `status` is failed.
    #[serde(default)]
    pub error: Option<JobFailure>,

    /// Back-reference to the source job when this record was created
    /// via remix. Relation only, not ownership.
    #[serde(default)]
    pub remixed_from_video_id: Option<String>,
}

impl VideoJob {
    /// Merge a freshly fetched remote record into this local record.
    ///
    /// Field-wise union with remote precedence: required fields are
    /// always taken from the remote record, optional fields only when
    /// the remote actually carries a value. `prompt` is the one
    /// exception -- an existing local prompt always wins.
    ///
    /// Both records must share the same `id`; `id` itself is never
    /// touched.
    pub fn merge_remote(&mut self, remote: VideoJob) {
        debug_assert_eq!(self.id, remote.id, "merge across different job ids");

        self.status = remote.status;
        self.progress = remote.progress;

        if self.prompt.is_none() {
            self.prompt = remote.prompt;
        }

        if remote.created_at.is_some() {
            self.created_at = remote.created_at;
        }
        if remote.completed_at.is_some() {
            self.completed_at = remote.completed_at;
        }
        if remote.expires_at.is_some() {
            self.expires_at = remote.expires_at;
        }
        if remote.model.is_some() {
            self.model = remote.model;
        }
        if remote.seconds.is_some() {
            self.seconds = remote.seconds;
        }
        if remote.size.is_some() {
            self.size = remote.size;
        }
        if remote.error.is_some() {
            self.error = remote.error;
        }
        if remote.remixed_from_video_id.is_some() {
            self.remixed_from_video_id = remote.remixed_from_video_id;
        }
    }

    /// A minimal record for a freshly submitted job, used before the
    /// first reconciliation fills in the remote view.
    pub fn newly_submitted(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: 0,
            prompt: Some(prompt.into()),
            created_at: Some(Utc::now()),
            completed_at: None,
            expires_at: None,
            model: None,
            seconds: None,
            size: None,
            error: None,
            remixed_from_video_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(id: &str, status: JobStatus) -> VideoJob {
        VideoJob {
            id: id.to_string(),
            status,
            progress: 0,
            prompt: None,
            created_at: None,
            completed_at: None,
            expires_at: None,
            model: None,
            seconds: None,
            size: None,
            error: None,
            remixed_from_video_id: None,
        }
    }

    #[test]
    fn merge_keeps_local_prompt_over_remote_echo() {
        let mut local = job("video_1", JobStatus::Queued);
        local.prompt = Some("a cat playing piano".into());

        let mut remote = job("video_1", JobStatus::Processing);
        remote.prompt = Some("A cat playing piano.".into());
        remote.progress = 40;

        local.merge_remote(remote);

        assert_eq!(local.prompt.as_deref(), Some("a cat playing piano"));
        assert_eq!(local.status, JobStatus::Processing);
        assert_eq!(local.progress, 40);
    }

    #[test]
    fn merge_adopts_remote_prompt_when_local_has_none() {
        let mut local = job("video_1", JobStatus::Queued);
        let mut remote = job("video_1", JobStatus::Queued);
        remote.prompt = Some("ocean waves".into());

        local.merge_remote(remote);

        assert_eq!(local.prompt.as_deref(), Some("ocean waves"));
    }

    #[test]
    fn merge_retains_local_fields_the_remote_omits() {
        let mut local = job("video_1", JobStatus::Processing);
        local.model = Some("sora-2".into());
        local.size = Some("720x1280".into());
        local.created_at = Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap());

        let remote = job("video_1", JobStatus::Completed);
        local.merge_remote(remote);

        assert_eq!(local.model.as_deref(), Some("sora-2"));
        assert_eq!(local.size.as_deref(), Some("720x1280"));
        assert!(local.created_at.is_some());
        assert_eq!(local.status, JobStatus::Completed);
    }

    #[test]
    fn merge_takes_remote_timestamps_once_reported() {
        let mut local = job("video_1", JobStatus::Processing);
        let mut remote = job("video_1", JobStatus::Completed);
        remote.completed_at = Some(Utc.timestamp_opt(1_700_000_100, 0).unwrap());
        remote.expires_at = Some(Utc.timestamp_opt(1_700_100_000, 0).unwrap());

        local.merge_remote(remote);

        assert!(local.completed_at.is_some());
        assert!(local.expires_at.is_some());
    }

    #[test]
    fn unknown_status_string_deserializes_to_unknown() {
        let parsed: JobStatus = serde_json::from_str("\"half_done\"").unwrap();
        assert_eq!(parsed, JobStatus::Unknown);
        assert!(!parsed.is_active());
        assert!(!parsed.is_terminal());
    }

    #[test]
    fn wire_timestamps_are_epoch_seconds() {
        let raw = r#"{
            "id": "video_abc",
            "status": "completed",
            "progress": 100,
            "created_at": 1700000000,
            "completed_at": 1700000200
        }"#;
        let parsed: VideoJob = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.created_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(parsed.completed_at.unwrap().timestamp(), 1_700_000_200);
        assert!(parsed.expires_at.is_none());

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["created_at"], 1_700_000_000);
    }

    #[test]
    fn active_and_terminal_statuses_do_not_overlap() {
        for status in [
            JobStatus::Queued,
            JobStatus::InProgress,
            JobStatus::Processing,
        ] {
            assert!(status.is_active());
            assert!(!status.is_terminal());
        }
        for status in [
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            assert!(!status.is_active());
        }
    }
}
