/// In-memory directory tree implementing [`DirLister`].
///
/// Lets walker behaviour be pinned down exactly: listing order, link entries
/// pointing at ancestors, unreadable directories, files whose metadata is
/// missing, and sizes assembled from two 32-bit halves. Open-listing
/// counters make handle discipline observable.
use super::listing::{DirLister, RawEntry};
use crate::model::path::{join_entry, normalize_root};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

enum MemDir {
    Entries(Vec<RawEntry>),
    Denied,
}

pub struct MemoryLister {
    root: String,
    dirs: HashMap<String, MemDir>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

/// Decrements the open counter on every exit path of `list`.
struct OpenGuard<'a>(&'a AtomicUsize);

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryLister {
    /// An empty tree rooted at `root`.
    pub fn new(root: &str) -> Self {
        let root = normalize_root(root);
        let mut dirs = HashMap::new();
        dirs.insert(root.clone(), MemDir::Entries(Vec::new()));
        Self {
            root,
            dirs,
            open: AtomicUsize::new(0),
            max_open: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Append `entry` to the listing of `parent` and return its full path.
    /// Directory entries get an empty listing of their own.
    ///
    /// # Panics
    ///
    /// If `parent` was never added as a directory.
    pub fn add(&mut self, parent: &str, entry: RawEntry) -> String {
        let path = join_entry(parent, &entry.name);
        if entry.is_dir() && !entry.is_link {
            self.dirs
                .entry(path.clone())
                .or_insert_with(|| MemDir::Entries(Vec::new()));
        }
        match self.dirs.get_mut(parent) {
            Some(MemDir::Entries(entries)) => entries.push(entry),
            Some(MemDir::Denied) => panic!("cannot add entries under denied dir {parent}"),
            None => panic!("unknown parent directory {parent}"),
        }
        path
    }

    pub fn add_dir(&mut self, parent: &str, name: &str) -> String {
        self.add(parent, RawEntry::dir(name))
    }

    pub fn add_file(&mut self, parent: &str, name: &str, size: u64) -> String {
        self.add(parent, RawEntry::file(name, size))
    }

    /// Make listing `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: &str) {
        self.dirs.insert(path.to_string(), MemDir::Denied);
    }

    /// Listings currently open.
    pub fn open_listings(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// High-water mark of simultaneously open listings.
    pub fn max_open_listings(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    /// Every directory passed to `list`, in call order.
    pub fn listed(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl DirLister for MemoryLister {
    fn list(&self, dir: &str) -> io::Result<Vec<RawEntry>> {
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = OpenGuard(&self.open);
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        self.calls.lock().push(dir.to_string());

        match self.dirs.get(dir) {
            Some(MemDir::Entries(entries)) => Ok(entries.clone()),
            Some(MemDir::Denied) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access denied: {dir}"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {dir}"),
            )),
        }
    }
}
