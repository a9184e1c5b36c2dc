/// Scanner module: orchestrates per-volume scans.
///
/// Each volume runs through `Idle → Scanning → Ranking → Reported` (or
/// `Failed`) with its own accumulator, so no mutable state is shared between
/// volumes even when they are scanned concurrently.
///
/// Two walk strategies:
/// - **Sequential** (`walk_workers == 1`), the default. Records
///   stream into a [`TopN`] with encounter-order ties, which reproduces a full
///   stable sort of the whole record set.
/// - **Parallel** (`walk_workers > 1`): workers share a directory queue and a
///   lock-protected [`TopN`]; ties fall back to path order because
///   concurrent emission order is not reproducible.
pub mod filter;
pub mod parallel;
pub mod progress;
pub mod walker;

use crate::analysis::{TieBreak, TopN, DEFAULT_TOP_N};
use crate::error::ScanError;
use crate::model::size::format_size;
use crate::model::RankedEntry;
use crate::platform::{DirLister, Volume};
use filter::{EntryFilter, FilterPolicy};
use progress::{ScanProgress, VolumePhase};
use walker::{StopSignal, WalkContext, WalkStats};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Maximum number of progress messages that may queue up in the channel.
///
/// If the consumer falls behind, scan threads block on `send` briefly
/// rather than consuming unbounded heap.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Scan settings shared by every volume of a run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Files listed per volume.
    pub top_n: usize,
    pub filter: FilterPolicy,
    /// Skip entries on a different device than the volume root, where the
    /// platform reports device ids.
    pub stay_on_volume: bool,
    /// Walk threads per volume; 1 selects the sequential walker.
    pub walk_workers: usize,
    /// Scan volumes concurrently, one per pool thread.
    pub parallel_volumes: bool,
    /// Stop each volume's walk after this long and report what was found.
    pub volume_timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            filter: FilterPolicy::default(),
            stay_on_volume: true,
            walk_workers: 1,
            parallel_volumes: false,
            volume_timeout: None,
        }
    }
}

impl ScanConfig {
    /// Tie-break implied by the walk strategy.
    pub fn tie_break(&self) -> TieBreak {
        if self.walk_workers > 1 {
            TieBreak::Path
        } else {
            TieBreak::EncounterOrder
        }
    }
}

/// Result of scanning one volume.
#[derive(Debug)]
pub struct VolumeReport {
    pub volume: Volume,
    /// `Reported` or `Failed`.
    pub phase: VolumePhase,
    /// Ranked top-N, best first. Empty when the volume failed.
    pub entries: Vec<RankedEntry>,
    pub stats: WalkStats,
    /// Why the volume failed, if it did.
    pub failure: Option<ScanError>,
    pub tie_break: TieBreak,
    pub duration: Duration,
}

impl VolumeReport {
    pub fn is_failed(&self) -> bool {
        self.phase == VolumePhase::Failed
    }

    /// The walk ended on cancellation or timeout; entries are partial.
    pub fn is_partial(&self) -> bool {
        self.stats.stopped
    }
}

fn send(progress: Option<&Sender<ScanProgress>>, msg: ScanProgress) {
    if let Some(tx) = progress {
        let _ = tx.send(msg);
    }
}

fn enter(progress: Option<&Sender<ScanProgress>>, volume: &Volume, phase: VolumePhase) {
    send(
        progress,
        ScanProgress::Phase {
            label: volume.label.clone(),
            root: volume.root.clone(),
            phase,
        },
    );
}

/// Scan and rank one volume.
///
/// Never fails: an unreadable root yields a `Failed` report carrying the
/// error, so the caller can move on to the next volume.
pub fn scan_volume(
    lister: &dyn DirLister,
    volume: &Volume,
    config: &ScanConfig,
    stop: &StopSignal,
    progress: Option<&Sender<ScanProgress>>,
) -> VolumeReport {
    let start = Instant::now();
    let label = volume.label.as_str();
    enter(progress, volume, VolumePhase::Idle);
    enter(progress, volume, VolumePhase::Scanning);
    info!("Processing {}", volume.root);

    let stop = match config.volume_timeout {
        Some(limit) => stop.with_deadline(start + limit),
        None => stop.clone(),
    };
    let root_device = if config.stay_on_volume {
        lister.device_of(&volume.root)
    } else {
        None
    };
    let ctx = WalkContext {
        lister,
        filter: EntryFilter::new(config.filter).with_root_device(root_device),
        stop: &stop,
        progress,
        label,
    };

    let tie_break = config.tie_break();
    let walked = if config.walk_workers > 1 {
        let sink = Mutex::new(TopN::new(config.top_n, tie_break));
        parallel::walk_parallel(&ctx, &volume.root, config.walk_workers, &sink)
            .map(|stats| (sink.into_inner(), stats))
    } else {
        let mut top = TopN::new(config.top_n, tie_break);
        match walker::walk(&ctx, &volume.root, |record| top.push(record)) {
            Ok(stats) => Ok((top, stats)),
            Err(err) => Err(err),
        }
    };

    let report = match walked {
        Ok((top, stats)) => {
            enter(progress, volume, VolumePhase::Ranking);
            let entries = top.into_ranked();
            let duration = start.elapsed();

            info!(
                "Scanned {} in {:.1} seconds",
                volume.root,
                duration.as_secs_f64()
            );
            info!(
                "Found {} files ({})",
                stats.files_found,
                format_size(stats.total_bytes)
            );
            if stats.error_count() > 0 {
                warn!(
                    "{}: skipped {} unreadable directories and {} unreadable files",
                    volume.root, stats.subtree_errors, stats.stat_errors
                );
            }
            if stats.stopped {
                warn!("{}: scan stopped early, ranking is partial", volume.root);
            }

            enter(progress, volume, VolumePhase::Reported);
            VolumeReport {
                volume: volume.clone(),
                phase: VolumePhase::Reported,
                entries,
                stats,
                failure: None,
                tie_break,
                duration,
            }
        }
        Err(err) => {
            warn!("{err}");
            enter(progress, volume, VolumePhase::Failed);
            VolumeReport {
                volume: volume.clone(),
                phase: VolumePhase::Failed,
                entries: Vec::new(),
                stats: WalkStats::default(),
                failure: Some(err),
                tie_break,
                duration: start.elapsed(),
            }
        }
    };

    send(
        progress,
        ScanProgress::VolumeComplete {
            label: label.to_string(),
            root: volume.root.clone(),
            files_found: report.stats.files_found,
            duration: report.duration,
            stopped: report.stats.stopped,
            failed: report.is_failed(),
        },
    );
    report
}

/// Scan `volumes` in order and return one report per volume started.
///
/// With `parallel_volumes`, volumes run on a rayon pool of
/// `min(volume count, CPU count)` threads; reports still come back in
/// source order. Volumes not yet started when `stop` is cancelled are left
/// out.
pub fn scan_volumes(
    lister: &dyn DirLister,
    volumes: &[Volume],
    config: &ScanConfig,
    stop: &StopSignal,
    progress: Option<&Sender<ScanProgress>>,
) -> Vec<VolumeReport> {
    let scan_one = |volume: &Volume| {
        if stop.is_cancelled() {
            info!("Cancelled before {}; not scanned", volume.root);
            return None;
        }
        Some(scan_volume(lister, volume, config, stop, progress))
    };

    if config.parallel_volumes && volumes.len() > 1 {
        let threads = volumes.len().min(num_cpus::get()).max(1);
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("largestfiles-volume-{i}"))
            .build()
        {
            Ok(pool) => {
                return pool.install(|| volumes.par_iter().filter_map(scan_one).collect());
            }
            Err(err) => warn!("cannot build volume pool ({err}); scanning sequentially"),
        }
    }

    volumes.iter().filter_map(scan_one).collect()
}

/// Handle to a run executing on a background thread.
pub struct RunHandle {
    /// Progress messages; disconnects when the run is over.
    pub progress_rx: Receiver<ScanProgress>,
    stop: StopSignal,
    thread: thread::JoinHandle<Vec<VolumeReport>>,
}

impl RunHandle {
    /// Ask the run to stop as soon as possible. Volumes in progress report
    /// partial results.
    pub fn cancel(&self) {
        self.stop.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Wait for the run and take its reports.
    ///
    /// The progress channel is bounded; keep draining `progress_rx` (or drop
    /// it) before joining, or the scan thread can block on a full channel.
    pub fn join(self) -> Vec<VolumeReport> {
        drop(self.progress_rx);
        match self.thread.join() {
            Ok(reports) => reports,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Start scanning `volumes` on a background thread.
///
/// Fails only if the OS refuses to spawn the scan thread.
pub fn start_run(
    lister: Arc<dyn DirLister>,
    volumes: Vec<Volume>,
    config: ScanConfig,
) -> io::Result<RunHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let stop = StopSignal::new();
    let stop_clone = stop.clone();

    let thread = thread::Builder::new()
        .name("largestfiles-scanner".into())
        .spawn(move || {
            let start = Instant::now();
            info!("Starting scan of {} volume(s)", volumes.len());
            let reports = scan_volumes(
                lister.as_ref(),
                &volumes,
                &config,
                &stop_clone,
                Some(&progress_tx),
            );
            let _ = progress_tx.send(ScanProgress::Finished {
                volumes: reports.len(),
                duration: start.elapsed(),
            });
            reports
        })?;

    Ok(RunHandle {
        progress_rx,
        stop,
        thread,
    })
}
