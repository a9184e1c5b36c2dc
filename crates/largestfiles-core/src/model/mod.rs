/// Data model for LargestFiles.
///
/// Re-exports the per-file record, its ranked view, and the path and size
/// helpers shared by the walkers and the report emitter.
pub mod file_record;
pub mod path;
pub mod size;

pub use file_record::{size_from_halves, FileRecord, RankedEntry};
