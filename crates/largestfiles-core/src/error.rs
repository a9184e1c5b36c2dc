/// Error taxonomy.
///
/// Scan errors are policy skips: each one removes a volume, a subtree or a
/// single file from the results and the run carries on. Only a failure to
/// write the report artifact ends a run.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The volume root could not be listed at all.
    #[error("volume {root} is unavailable: {source}")]
    VolumeUnavailable {
        root: String,
        #[source]
        source: io::Error,
    },

    /// A nested directory could not be listed; its subtree was skipped.
    #[error("cannot list {path}: {source}")]
    SubtreeUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A file's size could not be read; the file was skipped.
    #[error("cannot read metadata for {path}")]
    StatUnavailable { path: String },
}

impl ScanError {
    /// Path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::VolumeUnavailable { root, .. } => root,
            Self::SubtreeUnreadable { path, .. } | Self::StatUnavailable { path } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write CSV report: {0}")]
    Csv(#[from] csv::Error),
}
