/// Platform layer: directory listing and volume discovery.
///
/// Everything above this module is written against [`DirLister`] and
/// [`VolumeSource`], so the walkers, filter and ranker never touch an
/// OS-specific enumeration call directly.

pub mod listing;
pub mod memory;
pub mod volumes;

#[cfg(windows)]
pub mod drives;
#[cfg(windows)]
pub mod find;
#[cfg(not(windows))]
pub mod mounts;
#[cfg(not(windows))]
pub mod native;

pub use listing::{Attributes, DirLister, EntryKind, RawEntry};
pub use memory::MemoryLister;
pub use volumes::{ExplicitPaths, Volume, VolumeSource};

#[cfg(windows)]
pub use drives::{DriveType, LocalDrives};
#[cfg(windows)]
pub use find::NativeLister;
#[cfg(not(windows))]
pub use mounts::MountTable;
#[cfg(not(windows))]
pub use native::NativeLister;

/// The volume source for this platform: logical drives on Windows, the
/// mount table elsewhere.
pub fn default_volume_source() -> Box<dyn VolumeSource> {
    #[cfg(windows)]
    {
        Box::new(LocalDrives)
    }
    #[cfg(not(windows))]
    {
        Box::new(MountTable::default())
    }
}
