/// LargestFiles core: traversal, ranking and reporting.
///
/// This crate holds the scan engine with no console dependencies: the
/// binary only parses flags, prints progress and exits.
///
/// # Modules
///
/// - [`model`]: File records, path joining and size formatting.
/// - [`platform`]: Directory listers and volume sources per OS.
/// - [`scanner`]: Entry filter, tree walkers and the per-volume orchestrator.
/// - [`analysis`]: Top-N ranking.
/// - [`report`]: Text, CSV and JSON report emitter.
/// - [`error`]: Scan and report error types.
pub mod analysis;
pub mod error;
pub mod model;
pub mod platform;
pub mod report;
pub mod scanner;
