/// Combine the two 32-bit halves some platforms report into one byte count.
#[inline]
pub fn size_from_halves(high: u32, low: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

/// A single regular file discovered during one volume's traversal.
///
/// Records are created by the walkers, fed to the ranker, and dropped once
/// the volume's top-N has been extracted. Fields are private so a record
/// cannot change after it has been emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: String,
    size: u64,
}

impl FileRecord {
    pub fn new(path: String, size: u64) -> Self {
        Self { path, size }
    }

    /// Normalized absolute path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Exact size in bytes as reported at visit time.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size in MiB, the unit used by the text report.
    pub fn size_mib(&self) -> f64 {
        super::size::bytes_to_mib(self.size)
    }
}

/// A record together with its 0-based position in a volume's ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub record: FileRecord,
}

impl RankedEntry {
    #[inline]
    pub fn path(&self) -> &str {
        self.record.path()
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.record.size()
    }
}
