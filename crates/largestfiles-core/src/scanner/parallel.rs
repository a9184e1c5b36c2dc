/// Multi-worker tree walker for a single volume.
///
/// Pending directories go through a shared crossbeam channel; `workers`
/// scoped threads pull from it, list, and push subdirectories back. An
/// atomic pending counter (directories queued or being listed) tells the
/// workers when the tree is exhausted.
///
/// # Accumulator discipline
///
/// Records go into the volume's `Mutex<TopN>`, the only shared mutable state
/// of the walk. Locking once per file would serialize the workers, so each
/// worker buffers records locally and flushes them under a **single lock per
/// batch** of `BATCH_SIZE`.
///
/// # Ordering
///
/// Concurrent emission order is not reproducible, so the accumulator must be
/// built with [`TieBreak::Path`]: equal sizes rank by path, not by arrival.
use crate::analysis::{TieBreak, TopN};
use crate::error::ScanError;
use crate::model::FileRecord;
use crate::platform::RawEntry;
use crate::scanner::walker::{visit_entry, Visit, WalkContext, WalkStats, UPDATE_INTERVAL};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Records buffered per worker before one flush into the shared accumulator.
const BATCH_SIZE: usize = 2_000;

/// How long an idle worker waits for work before re-checking for completion.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Decrements the pending counter when a directory is done, even if the
/// worker unwinds, so the other workers still terminate.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Work queue shared by the workers of one walk.
struct Queue<'a> {
    tx: Sender<String>,
    rx: Receiver<String>,
    pending: &'a AtomicUsize,
}

impl Queue<'_> {
    fn push(&self, dir: String) {
        // Count before sending so no worker can observe zero while the
        // directory is in flight.
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(dir).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_drained(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }
}

fn flush(sink: &Mutex<TopN>, batch: &mut Vec<FileRecord>) {
    if batch.is_empty() {
        return;
    }
    sink.lock().extend(batch.drain(..));
}

/// Filter one listing, queueing subdirectories and batching files.
fn process_listing(
    ctx: &WalkContext<'_>,
    dir: &str,
    entries: Vec<RawEntry>,
    queue: &Queue<'_>,
    stats: &mut WalkStats,
    batch: &mut Vec<FileRecord>,
) {
    for entry in entries {
        match visit_entry(ctx, dir, &entry, stats) {
            Some(Visit::File(record)) => batch.push(record),
            Some(Visit::Dir(path)) => queue.push(path),
            None => {}
        }
    }
}

fn worker_loop(ctx: &WalkContext<'_>, queue: &Queue<'_>, sink: &Mutex<TopN>) -> WalkStats {
    let mut stats = WalkStats::default();
    let mut batch: Vec<FileRecord> = Vec::with_capacity(BATCH_SIZE + 64);
    let mut listed: u64 = 0;

    loop {
        match queue.rx.recv_timeout(IDLE_POLL) {
            Ok(dir) => {
                let _done = PendingGuard(queue.pending);

                // Stopped: drain the queue without listing anything new.
                if ctx.stop.should_stop() {
                    stats.stopped = true;
                    continue;
                }

                match ctx.lister.list(&dir) {
                    Ok(entries) => {
                        stats.dirs_visited += 1;
                        process_listing(ctx, &dir, entries, queue, &mut stats, &mut batch);
                    }
                    Err(source) => {
                        stats.subtree_errors += 1;
                        let err = ScanError::SubtreeUnreadable {
                            path: dir.clone(),
                            source,
                        };
                        ctx.report_error(&mut stats, err);
                    }
                }

                if batch.len() >= BATCH_SIZE {
                    flush(sink, &mut batch);
                }

                listed += 1;
                if listed % (UPDATE_INTERVAL / 10) == 0 {
                    ctx.send_update(&stats, &dir);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if queue.is_drained() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    flush(sink, &mut batch);
    stats
}

/// Walk `root` with `workers` threads, feeding every included file into
/// `sink`.
///
/// The root is listed on the calling thread; its failure fails the volume
/// exactly as in the sequential walker. Returns the merged counters of all
/// workers.
pub fn walk_parallel(
    ctx: &WalkContext<'_>,
    root: &str,
    workers: usize,
    sink: &Mutex<TopN>,
) -> Result<WalkStats, ScanError> {
    debug_assert_eq!(
        sink.lock().tie_break(),
        TieBreak::Path,
        "parallel walks need a path tie-break"
    );

    let root_entries = ctx.list_root(root)?;
    let mut stats = WalkStats {
        dirs_visited: 1,
        ..WalkStats::default()
    };

    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    let pending = AtomicUsize::new(0);
    let queue = Queue {
        tx,
        rx,
        pending: &pending,
    };

    let mut batch = Vec::new();
    process_listing(ctx, root, root_entries, &queue, &mut stats, &mut batch);
    flush(sink, &mut batch);

    if queue.is_drained() {
        return Ok(stats);
    }

    let workers = workers.max(1);
    debug!("Walking {root} with {workers} workers");

    let worker_stats: Vec<WalkStats> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let queue = &queue;
                thread::Builder::new()
                    .name(format!("largestfiles-walk-{i}"))
                    .spawn_scoped(s, move || worker_loop(ctx, queue, sink))
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|spawned| match spawned {
                Ok(handle) => match handle.join() {
                    Ok(stats) => Some(stats),
                    Err(_) => {
                        warn!("walk worker panicked; its counters are lost");
                        None
                    }
                },
                Err(err) => {
                    warn!("cannot spawn walk worker: {err}");
                    None
                }
            })
            .collect()
    });

    for ws in worker_stats {
        stats.merge(ws);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rank_with;
    use crate::platform::MemoryLister;
    use crate::scanner::filter::{EntryFilter, FilterPolicy};
    use crate::scanner::walker::{walk, StopSignal};

    fn wide_tree() -> MemoryLister {
        let mut fs = MemoryLister::new("/vol");
        let root = fs.root().to_string();
        for d in 0..20 {
            let dir = fs.add_dir(&root, &format!("d{d:02}"));
            for s in 0..5 {
                let sub = fs.add_dir(&dir, &format!("s{s}"));
                for f in 0..30 {
                    // Many equal sizes across directories.
                    fs.add_file(&sub, &format!("f{f:02}"), ((d * 7 + s * 3 + f) % 17) as u64);
                }
            }
        }
        let locked = fs.add_dir(&root, "locked");
        fs.deny(&locked);
        fs
    }

    fn ctx<'a>(fs: &'a MemoryLister, stop: &'a StopSignal) -> WalkContext<'a> {
        WalkContext {
            lister: fs,
            filter: EntryFilter::new(FilterPolicy::default()),
            stop,
            progress: None,
            label: "test",
        }
    }

    #[test]
    fn matches_sequential_ranking_under_path_tie_break() {
        let fs = wide_tree();
        let stop = StopSignal::new();
        let ctx = ctx(&fs, &stop);

        let mut all = Vec::new();
        let seq_stats = walk(&ctx, fs.root(), |r| all.push(r)).unwrap();
        let expected = rank_with(all, 100, TieBreak::Path);

        for workers in [1, 2, 4, 8] {
            let sink = Mutex::new(TopN::new(100, TieBreak::Path));
            let stats = walk_parallel(&ctx, fs.root(), workers, &sink).unwrap();
            assert_eq!(sink.into_inner().into_ranked(), expected, "workers = {workers}");
            assert_eq!(stats.files_found, seq_stats.files_found);
            assert_eq!(stats.dirs_visited, seq_stats.dirs_visited);
            assert_eq!(stats.subtree_errors, 1);
        }
    }

    #[test]
    fn every_listing_is_released() {
        let fs = wide_tree();
        let stop = StopSignal::new();
        let sink = Mutex::new(TopN::new(10, TieBreak::Path));
        walk_parallel(&ctx(&fs, &stop), fs.root(), 4, &sink).unwrap();
        assert_eq!(fs.open_listings(), 0);
        assert!(fs.max_open_listings() <= 4);
    }

    #[test]
    fn stopped_walk_lists_only_the_root() {
        let fs = wide_tree();
        let stop = StopSignal::new();
        stop.cancel();
        let sink = Mutex::new(TopN::new(10, TieBreak::Path));
        let stats = walk_parallel(&ctx(&fs, &stop), fs.root(), 4, &sink).unwrap();
        assert!(stats.stopped);
        assert_eq!(fs.listed(), [fs.root().to_string()]);
        assert!(sink.into_inner().is_empty());
    }
}
