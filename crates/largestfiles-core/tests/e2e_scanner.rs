/// End-to-end scanner integration tests.
///
/// These run the real `NativeLister`, both walkers, the orchestrator and the
/// report writer against temporary directory trees built with `tempfile`.
/// Ordering properties that depend on listing order (equal sizes ranked by
/// encounter order) are pinned with `MemoryLister`, since the OS does not
/// guarantee `read_dir` order.
use largestfiles_core::analysis::TieBreak;
use largestfiles_core::platform::{DirLister, MemoryLister, NativeLister, Volume};
use largestfiles_core::report::{ReportFormat, ReportWriter};
use largestfiles_core::scanner::progress::{ScanProgress, VolumePhase};
use largestfiles_core::scanner::walker::StopSignal;
use largestfiles_core::scanner::{scan_volume, scan_volumes, start_run, ScanConfig, VolumeReport};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   alpha/
///     a.txt      (100 bytes)
///     b.rs       (200 bytes)
///     deep/
///       e.log    (500 bytes)
///   beta/
///     c.png      (300 bytes)
///   d.zip        (400 bytes)
/// ```
///
/// Total file bytes: 1 500.
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let deep = alpha.join("deep");
    let beta = root.join("beta");
    fs::create_dir_all(&deep).unwrap();
    fs::create_dir_all(&beta).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&deep.join("e.log"), 500);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn scan_dir(dir: &Path, config: &ScanConfig) -> VolumeReport {
    let volume = Volume::new(dir.to_str().unwrap());
    scan_volume(&NativeLister, &volume, config, &StopSignal::new(), None)
}

fn sizes(report: &VolumeReport) -> Vec<u64> {
    report.entries.iter().map(|e| e.size()).collect()
}

fn file_names(report: &VolumeReport) -> Vec<String> {
    report
        .entries
        .iter()
        .map(|e| {
            Path::new(e.path())
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn ranks_a_real_tree_largest_first() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let report = scan_dir(tmp.path(), &ScanConfig::default());
    assert_eq!(report.phase, VolumePhase::Reported);
    assert_eq!(sizes(&report), [500, 400, 300, 200, 100]);
    assert_eq!(file_names(&report), ["e.log", "d.zip", "c.png", "b.rs", "a.txt"]);
    assert_eq!(report.stats.files_found, 5);
    assert_eq!(report.stats.total_bytes, 1_500);
    assert!(report.stats.errors.is_empty());
    for (i, entry) in report.entries.iter().enumerate() {
        assert_eq!(entry.rank, i);
    }
}

#[test]
fn every_ranked_record_is_a_real_file_with_its_size() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let report = scan_dir(tmp.path(), &ScanConfig::default());
    for entry in &report.entries {
        let meta = fs::metadata(entry.path()).unwrap();
        assert!(meta.is_file(), "{} is not a file", entry.path());
        assert_eq!(meta.len(), entry.size());
        assert!(Path::new(entry.path()).starts_with(tmp.path()));
    }
}

#[cfg(not(windows))]
#[test]
fn dot_entries_are_hidden_unless_requested() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let cache = tmp.path().join(".cache");
    fs::create_dir(&cache).unwrap();
    write_bytes(&cache.join("huge.bin"), 9_000);
    write_bytes(&tmp.path().join(".profile"), 50);

    let default = scan_dir(tmp.path(), &ScanConfig::default());
    assert_eq!(default.stats.files_found, 5);
    assert!(!file_names(&default).iter().any(|n| n == "huge.bin" || n == ".profile"));

    let mut config = ScanConfig::default();
    config.filter.skip_hidden = false;
    let all = scan_dir(tmp.path(), &config);
    assert_eq!(all.stats.files_found, 7);
    assert_eq!(file_names(&all)[0], "huge.bin");
    assert_eq!(*sizes(&all).last().unwrap(), 50);
}

#[test]
fn truncates_to_top_n() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let config = ScanConfig {
        top_n: 2,
        ..ScanConfig::default()
    };
    let report = scan_dir(tmp.path(), &config);
    assert_eq!(sizes(&report), [500, 400]);
    assert_eq!(report.stats.files_found, 5);

    let none = scan_dir(
        tmp.path(),
        &ScanConfig {
            top_n: 0,
            ..ScanConfig::default()
        },
    );
    assert!(none.entries.is_empty());
    assert_eq!(none.phase, VolumePhase::Reported);
}

#[test]
fn repeated_scans_are_identical() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    for i in 0..30 {
        write_bytes(&tmp.path().join("beta").join(format!("same{i:02}")), 256);
    }

    let first = scan_dir(tmp.path(), &ScanConfig::default());
    for _ in 0..20 {
        let again = scan_dir(tmp.path(), &ScanConfig::default());
        assert_eq!(again.entries, first.entries);
    }
}

#[test]
fn parallel_walk_agrees_with_sequential_walk() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    for d in 0..8 {
        let dir = tmp.path().join(format!("bulk{d}"));
        fs::create_dir(&dir).unwrap();
        for f in 0..25 {
            write_bytes(&dir.join(format!("f{f:02}")), (d * 31 + f * 7) % 40);
        }
    }

    let sequential = scan_dir(tmp.path(), &ScanConfig::default());
    for workers in [2, 4, 8] {
        let config = ScanConfig {
            walk_workers: workers,
            ..ScanConfig::default()
        };
        let parallel = scan_dir(tmp.path(), &config);
        assert_eq!(parallel.tie_break, TieBreak::Path);
        assert_eq!(parallel.stats.files_found, sequential.stats.files_found);
        assert_eq!(sizes(&parallel), sizes(&sequential), "workers = {workers}");

        // Ties are resolved by path, so each equal-size run is sorted.
        for pair in parallel.entries.windows(2) {
            if pair[0].size() == pair[1].size() {
                assert!(pair[0].path() < pair[1].path());
            }
        }
    }
}

#[cfg(unix)]
#[test]
fn symlink_cycle_terminates_and_is_not_followed() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let alpha = tmp.path().join("alpha");
    std::os::unix::fs::symlink(tmp.path(), alpha.join("loop")).unwrap();
    std::os::unix::fs::symlink(alpha.join("a.txt"), tmp.path().join("a-link")).unwrap();

    let report = scan_dir(tmp.path(), &ScanConfig::default());
    assert_eq!(report.stats.files_found, 5);
    assert_eq!(report.stats.links_skipped, 2);
    assert!(!report.entries.iter().any(|e| e.path().contains("loop")));
}

#[test]
fn equal_sizes_keep_encounter_order() {
    let mut tree = MemoryLister::new("/vol");
    let root = tree.root().to_string();
    tree.add_file(&root, "A", 10);
    tree.add_file(&root, "B", 5);
    tree.add_file(&root, "C", 10);

    let report = scan_volume(
        &tree,
        &Volume::new(&root),
        &ScanConfig::default(),
        &StopSignal::new(),
        None,
    );
    assert_eq!(file_names(&report), ["A", "C", "B"]);
}

#[test]
fn unreadable_root_fails_only_that_volume() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let missing = tmp.path().join("not-there");

    let volumes = [
        Volume::new(missing.to_str().unwrap()),
        Volume::new(tmp.path().to_str().unwrap()),
    ];
    let reports = scan_volumes(
        &NativeLister,
        &volumes,
        &ScanConfig::default(),
        &StopSignal::new(),
        None,
    );
    assert_eq!(reports.len(), 2);
    assert!(reports[0].is_failed());
    assert!(reports[0].entries.is_empty());
    assert_eq!(reports[1].entries.len(), 5);
}

#[test]
fn expired_timeout_keeps_root_level_results() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let config = ScanConfig {
        volume_timeout: Some(Duration::ZERO),
        ..ScanConfig::default()
    };
    let report = scan_dir(tmp.path(), &config);
    assert!(report.is_partial());
    assert_eq!(report.phase, VolumePhase::Reported);
    // No subdirectory is listed, but the root listing is consumed whole.
    assert_eq!(file_names(&report), ["d.zip"]);
    assert_eq!(report.stats.dirs_visited, 1);
}

#[test]
fn parallel_volumes_return_in_source_order() {
    let roots: Vec<TempDir> = (0..4).map(|_| TempDir::new().unwrap()).collect();
    for (i, root) in roots.iter().enumerate() {
        write_bytes(&root.path().join("only"), 10 * (i + 1));
    }
    let volumes: Vec<Volume> = roots
        .iter()
        .map(|r| Volume::new(r.path().to_str().unwrap()))
        .collect();

    let config = ScanConfig {
        parallel_volumes: true,
        ..ScanConfig::default()
    };
    let reports = scan_volumes(&NativeLister, &volumes, &config, &StopSignal::new(), None);
    let got: Vec<u64> = reports.iter().map(|r| r.entries[0].size()).collect();
    assert_eq!(got, [10, 20, 30, 40]);
    for (report, volume) in reports.iter().zip(&volumes) {
        assert_eq!(&report.volume, volume);
    }
}

#[test]
fn background_run_streams_progress_and_writes_report() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    build_test_tree(&data);
    let out = tmp.path().join("largest_files.txt");

    let lister: Arc<dyn DirLister> = Arc::new(NativeLister);
    let volume = Volume::with_label(data.to_str().unwrap(), "DATA");
    let handle = start_run(lister, vec![volume], ScanConfig::default()).unwrap();

    let mut phases = Vec::new();
    let mut finished = false;
    for msg in handle.progress_rx.iter() {
        match msg {
            ScanProgress::Phase { phase, .. } => phases.push(phase),
            ScanProgress::Finished { volumes, .. } => {
                assert_eq!(volumes, 1);
                finished = true;
            }
            _ => {}
        }
    }
    assert!(finished, "channel closed before Finished was sent");
    assert_eq!(
        phases,
        [
            VolumePhase::Idle,
            VolumePhase::Scanning,
            VolumePhase::Ranking,
            VolumePhase::Reported
        ]
    );

    let reports = handle.join();
    let mut writer = ReportWriter::create(&out, ReportFormat::Text).unwrap();
    for report in &reports {
        writer.write_volume(report).unwrap();
    }
    writer.finish().unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Largest files on DATA:");
    assert_eq!(lines.len(), 1 + 5 + 1);
    assert!(lines[1].ends_with("e.log: 0.00 MB"));
    assert_eq!(lines[6], "");
}
