/// Sequential tree walker.
///
/// Depth-first, pre-order, driven by an explicit stack of
/// `(directory, remaining entries)` frames instead of recursion, so tree
/// depth is bounded by heap memory rather than the call stack. Entries are
/// consumed in listing order, which makes the emission order identical to a
/// recursive walk and reproducible across runs over an unchanged tree.
///
/// Each directory's listing is fully materialized by the lister before the
/// walker descends, so no listing handle stays open while a subtree is
/// explored.
use crate::error::ScanError;
use crate::model::path::join_entry;
use crate::model::FileRecord;
use crate::platform::{DirLister, RawEntry};
use crate::scanner::filter::{EntryFilter, SkipReason, Verdict};
use crate::scanner::progress::ScanProgress;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Entries between two `ScanProgress::Update` messages.
pub const UPDATE_INTERVAL: u64 = 5_000;

/// Errors kept verbatim per volume; further errors are only counted.
pub const MAX_RECORDED_ERRORS: usize = 1_000;

/// Cooperative stop request: a shared flag plus an optional deadline.
///
/// Walkers poll it before listing each directory. Once raised, no new
/// directory is listed, listings already in progress complete, and the
/// walk returns what it has so far.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Same flag, plus a deadline after which the signal reads as raised.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Counters and retained errors of one volume walk.
#[derive(Debug, Default)]
pub struct WalkStats {
    pub files_found: u64,
    pub total_bytes: u64,
    /// Directories successfully listed, root included.
    pub dirs_visited: u64,
    /// Entries excluded by the filter, links included.
    pub entries_skipped: u64,
    pub links_skipped: u64,
    pub subtree_errors: u64,
    pub stat_errors: u64,
    /// First [`MAX_RECORDED_ERRORS`] errors.
    pub errors: Vec<ScanError>,
    /// The walk ended early on a stop request.
    pub stopped: bool,
}

impl WalkStats {
    fn note_skip(&mut self, reason: SkipReason) {
        self.entries_skipped += 1;
        if reason == SkipReason::Link {
            self.links_skipped += 1;
        }
    }

    pub fn error_count(&self) -> u64 {
        self.subtree_errors + self.stat_errors
    }

    /// Fold another worker's counters into this one.
    pub fn merge(&mut self, other: WalkStats) {
        self.files_found += other.files_found;
        self.total_bytes += other.total_bytes;
        self.dirs_visited += other.dirs_visited;
        self.entries_skipped += other.entries_skipped;
        self.links_skipped += other.links_skipped;
        self.subtree_errors += other.subtree_errors;
        self.stat_errors += other.stat_errors;
        self.stopped |= other.stopped;
        let room = MAX_RECORDED_ERRORS.saturating_sub(self.errors.len());
        self.errors.extend(other.errors.into_iter().take(room));
    }
}

/// Everything a walker needs besides the root.
pub struct WalkContext<'a> {
    pub lister: &'a dyn DirLister,
    pub filter: EntryFilter,
    pub stop: &'a StopSignal,
    pub progress: Option<&'a Sender<ScanProgress>>,
    /// Volume label used in progress messages.
    pub label: &'a str,
}

impl WalkContext<'_> {
    pub(crate) fn send(&self, msg: ScanProgress) {
        if let Some(tx) = self.progress {
            let _ = tx.send(msg);
        }
    }

    pub(crate) fn report_error(&self, stats: &mut WalkStats, err: ScanError) {
        debug!("{err}");
        self.send(ScanProgress::Error {
            path: err.path().to_string(),
            message: err.to_string(),
        });
        if stats.errors.len() < MAX_RECORDED_ERRORS {
            stats.errors.push(err);
        }
    }

    pub(crate) fn send_update(&self, stats: &WalkStats, current_path: &str) {
        self.send(ScanProgress::Update {
            label: self.label.to_string(),
            files_found: stats.files_found,
            dirs_visited: stats.dirs_visited,
            current_path: current_path.to_string(),
        });
    }

    /// List the volume root; failure here fails the whole volume.
    pub(crate) fn list_root(&self, root: &str) -> Result<Vec<RawEntry>, ScanError> {
        self.lister
            .list(root)
            .map_err(|source| ScanError::VolumeUnavailable {
                root: root.to_string(),
                source,
            })
    }
}

/// Outcome of applying the filter to one entry.
pub(crate) enum Visit {
    Dir(String),
    File(FileRecord),
}

/// Classify `entry` of `dir`, updating counters. Files without a size are
/// counted as stat errors and dropped.
pub(crate) fn visit_entry(
    ctx: &WalkContext<'_>,
    dir: &str,
    entry: &RawEntry,
    stats: &mut WalkStats,
) -> Option<Visit> {
    match ctx.filter.classify(entry) {
        Verdict::Skip(reason) => {
            trace!("skip {:?}: {}", reason, join_entry(dir, &entry.name));
            stats.note_skip(reason);
            None
        }
        Verdict::Descend => Some(Visit::Dir(join_entry(dir, &entry.name))),
        Verdict::Record => {
            let path = join_entry(dir, &entry.name);
            match entry.size {
                Some(size) => {
                    stats.files_found += 1;
                    stats.total_bytes += size;
                    Some(Visit::File(FileRecord::new(path, size)))
                }
                None => {
                    stats.stat_errors += 1;
                    ctx.report_error(stats, ScanError::StatUnavailable { path });
                    None
                }
            }
        }
    }
}

struct Frame {
    dir: String,
    entries: std::vec::IntoIter<RawEntry>,
}

/// Walk `root`, calling `emit` once per included regular file in
/// depth-first encounter order.
///
/// Fails only when the root itself cannot be listed. Unreadable
/// subdirectories and unreadable files are skipped and counted.
pub fn walk<F>(ctx: &WalkContext<'_>, root: &str, mut emit: F) -> Result<WalkStats, ScanError>
where
    F: FnMut(FileRecord),
{
    let root_entries = ctx.list_root(root)?;
    let mut stats = WalkStats {
        dirs_visited: 1,
        ..WalkStats::default()
    };
    let mut stack = vec![Frame {
        dir: root.to_string(),
        entries: root_entries.into_iter(),
    }];
    let mut visited: u64 = 0;

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.entries.next() else {
            stack.pop();
            continue;
        };
        visited += 1;

        match visit_entry(ctx, &frame.dir, &entry, &mut stats) {
            Some(Visit::File(record)) => emit(record),
            Some(Visit::Dir(path)) => {
                // Once stopped, no new directory is listed; files already
                // listed in open frames are still emitted.
                if stats.stopped || ctx.stop.should_stop() {
                    stats.stopped = true;
                    continue;
                }
                match ctx.lister.list(&path) {
                    Ok(children) => {
                        stats.dirs_visited += 1;
                        stack.push(Frame {
                            dir: path,
                            entries: children.into_iter(),
                        });
                    }
                    Err(source) => {
                        stats.subtree_errors += 1;
                        let err = ScanError::SubtreeUnreadable { path, source };
                        ctx.report_error(&mut stats, err);
                    }
                }
            }
            None => {}
        }

        if visited.is_multiple_of(UPDATE_INTERVAL) {
            if let Some(top) = stack.last() {
                ctx.send_update(&stats, &top.dir);
            }
        }
    }

    Ok(stats)
}
