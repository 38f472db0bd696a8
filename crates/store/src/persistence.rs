//! Durable storage for the job list.
//!
//! The whole list is rewritten on every mutation: the payload is small
//! and a full replace needs no transactional machinery. The file
//! carries a schema version so a future format change can be detected
//! instead of silently misparsed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sora_core::VideoJob;

/// Current on-disk format version.
pub const SCHEMA_VERSION: u32 = 1;

/// On-disk envelope for the job list.
#[derive(Debug, Serialize, Deserialize)]
struct JobsFile {
    version: u32,
    jobs: Vec<VideoJob>,
}

/// Reads and writes the jobs file at a fixed path.
pub struct JobsFileStore {
    path: PathBuf,
}

impl JobsFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted job list.
    ///
    /// A missing file is a fresh start. A corrupt file or one written
    /// by a newer schema is logged and treated as empty rather than
    /// aborting startup.
    pub fn load(&self) -> Vec<VideoJob> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read jobs file, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<JobsFile>(&raw) {
            Ok(file) if file.version > SCHEMA_VERSION => {
                tracing::warn!(
                    path = %self.path.display(),
                    file_version = file.version,
                    supported = SCHEMA_VERSION,
                    "Jobs file written by a newer version, starting empty"
                );
                Vec::new()
            }
            Ok(file) => file.jobs,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Jobs file is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the persisted list with a snapshot.
    ///
    /// Writes to a sibling temp file and renames it into place so a
    /// crash mid-write cannot leave a truncated file behind.
    pub fn save(&self, jobs: &[VideoJob]) -> io::Result<()> {
        let file = JobsFile {
            version: SCHEMA_VERSION,
            jobs: jobs.to_vec(),
        };
        let serialized = serde_json::to_string_pretty(&file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)
    }
}
