/// Scan progress reporting: lightweight messages sent from scan threads to
/// whoever is watching the run, over a bounded crossbeam channel.
use std::fmt;
use std::time::Duration;

/// Per-volume lifecycle.
///
/// `Idle → Scanning → Ranking → Reported`, or `Scanning → Failed` when the
/// root cannot be listed. Either way the next volume starts at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumePhase {
    Idle,
    Scanning,
    Ranking,
    Reported,
    Failed,
}

impl VolumePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Ranking => "ranking",
            Self::Reported => "reported",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VolumePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum ScanProgress {
    /// A volume entered a new phase.
    Phase {
        label: String,
        root: String,
        phase: VolumePhase,
    },
    /// Periodic running totals for the volume being walked.
    Update {
        label: String,
        files_found: u64,
        dirs_visited: u64,
        current_path: String,
    },
    /// A non-fatal error: an unreadable subtree or a file without metadata.
    Error { path: String, message: String },
    /// A volume finished, successfully or not.
    VolumeComplete {
        label: String,
        root: String,
        files_found: u64,
        duration: Duration,
        /// Cancelled or timed out; the ranking is partial.
        stopped: bool,
        failed: bool,
    },
    /// Every volume of the run has been processed.
    Finished { volumes: usize, duration: Duration },
}
