//! LargestFiles: lists the largest files on every local volume.
//!
//! Thin binary entry point. All scanning, ranking and report logic lives in
//! the `largestfiles-core` crate; this file parses flags, prints progress
//! and writes the report.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use largestfiles_core::platform::{NativeLister, VolumeSource};
use largestfiles_core::report::ReportWriter;
use largestfiles_core::scanner::progress::{ScanProgress, VolumePhase};
use largestfiles_core::scanner::start_run;
use std::sync::Arc;

/// Width of the dashed rule under the banner.
const BANNER_RULE_WIDTH: usize = 40;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let source = cli.volume_source();
    run(&cli, source.as_ref())
}

/// Scan every volume of `source` and write the report.
///
/// Only a report that cannot be written is an error; finding no volume
/// is reported on stderr and ends the run normally.
fn run(cli: &Cli, source: &dyn VolumeSource) -> anyhow::Result<()> {
    println!("File Scanner");
    println!("{}", "-".repeat(BANNER_RULE_WIDTH));

    let volumes = source.volumes();
    if volumes.is_empty() {
        eprintln!("No suitable drives found!");
        return Ok(());
    }
    for volume in &volumes {
        println!("Including drive: {}", volume.label);
    }

    // Open the artifact before scanning so an unwritable target fails fast.
    let mut writer = ReportWriter::create(&cli.output, cli.format.into())?;

    let handle = start_run(Arc::new(NativeLister), volumes, cli.scan_config())
        .context("cannot start scan thread")?;

    for msg in handle.progress_rx.iter() {
        match msg {
            ScanProgress::Phase {
                root,
                phase: VolumePhase::Scanning,
                ..
            } => {
                println!("\nProcessing {root}");
            }
            ScanProgress::Phase { label, phase, .. } => {
                tracing::debug!("{label}: {phase}");
            }
            ScanProgress::Update {
                label,
                files_found,
                current_path,
                ..
            } => {
                tracing::debug!("{label}: {files_found} files so far, in {current_path}");
            }
            // Logged by the walker already.
            ScanProgress::Error { .. } => {}
            ScanProgress::VolumeComplete {
                root,
                files_found,
                duration,
                stopped,
                failed,
                ..
            } => {
                if failed {
                    println!("Could not scan {root}");
                    continue;
                }
                println!("Scanned {root} in {:.1} seconds", duration.as_secs_f64());
                println!("Found {files_found} files");
                if stopped {
                    println!("Scan of {root} stopped early; results are partial");
                }
            }
            ScanProgress::Finished { volumes, duration } => {
                tracing::info!(
                    "Scanned {volumes} volume(s) in {:.1} seconds",
                    duration.as_secs_f64()
                );
            }
        }
    }

    let reports = handle.join();
    for report in &reports {
        writer.write_volume(report)?;
    }
    writer.finish()?;

    println!("\nScan complete. Results saved to {}", cli.output.display());
    Ok(())
}
