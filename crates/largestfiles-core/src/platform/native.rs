/// `std::fs::read_dir` lister for Unix-like platforms.
///
/// Uses `DirEntry::metadata`, which does not traverse symlinks, so a link is
/// reported as a link and never as its target. Dot-prefixed names carry the
/// HIDDEN attribute, the convention these platforms use for hidden entries.
use super::listing::{Attributes, DirLister, EntryKind, RawEntry};
use compact_str::CompactString;
use std::fs;
use std::io;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLister;

impl DirLister for NativeLister {
    fn list(&self, dir: &str) -> io::Result<Vec<RawEntry>> {
        // `ReadDir` closes its descriptor on drop, including the early
        // return taken when an item read fails.
        let read_dir = fs::read_dir(dir)?;
        let mut entries = Vec::new();

        for item in read_dir {
            let entry = item?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let meta = entry.metadata();
            let file_type = match &meta {
                Ok(m) => Some(m.file_type()),
                Err(_) => entry.file_type().ok(),
            };

            let (kind, is_link) = match file_type {
                Some(ft) if ft.is_symlink() => (EntryKind::Other, true),
                Some(ft) if ft.is_dir() => (EntryKind::Directory, false),
                Some(ft) if ft.is_file() => (EntryKind::File, false),
                _ => (EntryKind::Other, false),
            };

            let mut attributes = Attributes::NONE;
            if name.starts_with('.') {
                attributes = attributes | Attributes::HIDDEN;
            }
            if kind == EntryKind::Directory {
                attributes = attributes | Attributes::DIRECTORY;
            }
            if is_link {
                attributes = attributes | Attributes::REPARSE_POINT;
            }

            let meta = meta.ok();
            let size = match kind {
                EntryKind::File => meta.as_ref().map(|m| m.len()),
                _ => None,
            };

            entries.push(RawEntry {
                name: CompactString::new(name.as_ref()),
                kind,
                is_link,
                attributes,
                size,
                device: meta.as_ref().and_then(device_id),
            });
        }

        Ok(entries)
    }

    fn device_of(&self, path: &str) -> Option<u64> {
        fs::metadata(path).ok().as_ref().and_then(device_id)
    }
}

#[cfg(unix)]
fn device_id(meta: &fs::Metadata) -> Option<u64> {
    Some(meta.dev())
}

#[cfg(not(unix))]
fn device_id(_meta: &fs::Metadata) -> Option<u64> {
    None
}
