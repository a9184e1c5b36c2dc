/// The directory-listing capability used by both walkers.
use compact_str::CompactString;
use std::io;
use std::ops::BitOr;

/// Entry attribute bits. Values match the Win32 `FILE_ATTRIBUTE_*` constants
/// so Windows listers can pass `dwFileAttributes` through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Attributes(pub u32);

impl Attributes {
    pub const NONE: Self = Self(0);
    pub const HIDDEN: Self = Self(0x2);
    pub const SYSTEM: Self = Self(0x4);
    pub const DIRECTORY: Self = Self(0x10);
    pub const TEMPORARY: Self = Self(0x100);
    pub const REPARSE_POINT: Self = Self(0x400);

    /// `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Attributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// FIFOs, sockets, devices, dangling entries of unknown type.
    Other,
}

/// One entry as reported by a directory listing.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// Name only, not the full path.
    pub name: CompactString,
    pub kind: EntryKind,
    /// Symbolic link, junction, or any other reparse point.
    pub is_link: bool,
    pub attributes: Attributes,
    /// Byte size for files. `None` when the metadata could not be read.
    pub size: Option<u64>,
    /// Device id of the filesystem holding the entry, where the platform
    /// exposes one.
    pub device: Option<u64>,
}

impl RawEntry {
    pub fn file(name: &str, size: u64) -> Self {
        Self {
            name: CompactString::new(name),
            kind: EntryKind::File,
            is_link: false,
            attributes: Attributes::NONE,
            size: Some(size),
            device: None,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: CompactString::new(name),
            kind: EntryKind::Directory,
            is_link: false,
            attributes: Attributes::DIRECTORY,
            size: None,
            device: None,
        }
    }

    /// A link entry. `target_is_dir` only affects `kind`; links are never
    /// followed either way.
    pub fn link(name: &str, target_is_dir: bool) -> Self {
        let mut entry = if target_is_dir {
            Self::dir(name)
        } else {
            Self::file(name, 0)
        };
        entry.is_link = true;
        entry.attributes = entry.attributes | Attributes::REPARSE_POINT;
        entry
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = self.attributes | attributes;
        self
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    pub fn with_device(mut self, device: u64) -> Self {
        self.device = Some(device);
        self
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Lists the immediate entries of one directory, in the order the
/// underlying call reports them.
///
/// Implementations must release any OS handle before returning, on success
/// and on error alike. Walkers rely on this to keep at most one listing
/// handle open per worker.
pub trait DirLister: Send + Sync {
    fn list(&self, dir: &str) -> io::Result<Vec<RawEntry>>;

    /// Device id of `path` itself, used to keep a walk on one volume.
    fn device_of(&self, _path: &str) -> Option<u64> {
        None
    }
}
