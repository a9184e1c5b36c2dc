/// `FindFirstFileW` / `FindNextFileW` lister for Windows.
///
/// The find data already carries attributes and both halves of the file
/// size, so no per-file metadata call is made. The search handle lives in a
/// guard that calls `FindClose` on drop, covering early returns.
use super::listing::{Attributes, DirLister, EntryKind, RawEntry};
use crate::model::path::join_entry;
use crate::model::size_from_halves;
use compact_str::CompactString;
use std::io;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES, HANDLE};
use windows::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, FindNextFileW, WIN32_FIND_DATAW,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLister;

struct FindHandle(HANDLE);

impl Drop for FindHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = FindClose(self.0);
        }
    }
}

fn to_io_error(err: windows::core::Error) -> io::Error {
    // Win32 failures are surfaced as HRESULT_FROM_WIN32; the low word is the
    // original error code.
    io::Error::from_raw_os_error(err.code().0 & 0xFFFF)
}

/// `FindFirstFileW` reports a directory with no entries at all, such as an
/// empty drive root, as file-not-found.
fn is_empty_listing(err: &windows::core::Error) -> bool {
    err.code() == ERROR_FILE_NOT_FOUND.to_hresult()
}

fn entry_from_find_data(data: &WIN32_FIND_DATAW) -> RawEntry {
    let len = data
        .cFileName
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(data.cFileName.len());
    let name = String::from_utf16_lossy(&data.cFileName[..len]);

    let attributes = Attributes(data.dwFileAttributes);
    let kind = if attributes.contains(Attributes::DIRECTORY) {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let size = match kind {
        EntryKind::File => Some(size_from_halves(data.nFileSizeHigh, data.nFileSizeLow)),
        _ => None,
    };

    RawEntry {
        name: CompactString::new(&name),
        kind,
        is_link: attributes.contains(Attributes::REPARSE_POINT),
        attributes,
        size,
        device: None,
    }
}

impl DirLister for NativeLister {
    fn list(&self, dir: &str) -> io::Result<Vec<RawEntry>> {
        let pattern = join_entry(dir, "*");
        let wide: Vec<u16> = pattern.encode_utf16().chain(std::iter::once(0)).collect();
        let mut data = WIN32_FIND_DATAW::default();

        let handle = match unsafe { FindFirstFileW(PCWSTR(wide.as_ptr()), &mut data) } {
            Ok(handle) => handle,
            Err(err) if is_empty_listing(&err) => return Ok(Vec::new()),
            Err(err) => return Err(to_io_error(err)),
        };
        let guard = FindHandle(handle);

        let mut entries = Vec::new();
        loop {
            entries.push(entry_from_find_data(&data));
            if let Err(err) = unsafe { FindNextFileW(guard.0, &mut data) } {
                if err.code() == ERROR_NO_MORE_FILES.to_hresult() {
                    break;
                }
                return Err(to_io_error(err));
            }
        }

        Ok(entries)
    }
}
