/// Top-N largest files ranking.
///
/// [`rank`] is the reference: a stable sort of the whole record set by size
/// descending, truncated to `n`. [`TopN`] keeps only `n` candidates in a
/// bounded min-heap while records stream in from a walker, and produces the
/// same order as [`rank_with`] for the same input.
use crate::model::{FileRecord, RankedEntry};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// How many files each volume section lists.
pub const DEFAULT_TOP_N: usize = 100;

/// Order among files of equal size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Earlier-emitted record first. Only reproducible for sequential walks.
    #[default]
    EncounterOrder,
    /// Lexicographically smaller path first, independent of emission order.
    Path,
}

/// Stable size-descending ranking with encounter-order ties.
pub fn rank(records: Vec<FileRecord>, n: usize) -> Vec<RankedEntry> {
    rank_with(records, n, TieBreak::EncounterOrder)
}

/// Full sort + truncate for either tie-break.
pub fn rank_with(mut records: Vec<FileRecord>, n: usize, tie: TieBreak) -> Vec<RankedEntry> {
    // `sort_by` is stable, so equal keys keep encounter order.
    match tie {
        TieBreak::EncounterOrder => records.sort_by(|a, b| b.size().cmp(&a.size())),
        TieBreak::Path => {
            records.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.path().cmp(b.path())))
        }
    }
    records.truncate(n);
    records
        .into_iter()
        .enumerate()
        .map(|(rank, record)| RankedEntry { rank, record })
        .collect()
}

/// A record plus its arrival sequence. `Ord` puts better-ranked candidates
/// higher.
#[derive(Debug)]
struct Candidate {
    record: FileRecord,
    seq: u64,
    tie: TieBreak,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record
            .size()
            .cmp(&other.record.size())
            .then_with(|| match self.tie {
                TieBreak::EncounterOrder => Ordering::Equal,
                TieBreak::Path => other.record.path().cmp(self.record.path()),
            })
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Streaming top-N accumulator.
///
/// Memory is O(n) regardless of how many records are pushed. The heap root
/// is always the worst retained candidate, so each push is O(log n).
#[derive(Debug)]
pub struct TopN {
    capacity: usize,
    tie: TieBreak,
    heap: BinaryHeap<Reverse<Candidate>>,
    seen: u64,
}

impl TopN {
    pub fn new(capacity: usize, tie: TieBreak) -> Self {
        Self {
            capacity,
            tie,
            heap: BinaryHeap::with_capacity(capacity.min(4_096) + 1),
            seen: 0,
        }
    }

    /// Offer one record. Records are sequenced in push order.
    pub fn push(&mut self, record: FileRecord) {
        let candidate = Candidate {
            record,
            seq: self.seen,
            tie: self.tie,
        };
        self.seen += 1;

        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
            return;
        }
        let beats_worst = self
            .heap
            .peek()
            .is_some_and(|Reverse(worst)| candidate > *worst);
        if beats_worst {
            self.heap.pop();
            self.heap.push(Reverse(candidate));
        }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = FileRecord>) {
        for record in records {
            self.push(record);
        }
    }

    /// Records offered so far, retained or not.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Records currently retained.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie
    }

    /// Consume the accumulator and return the ranking, best first.
    pub fn into_ranked(self) -> Vec<RankedEntry> {
        let mut candidates: Vec<Candidate> =
            self.heap.into_iter().map(|Reverse(c)| c).collect();
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        candidates
            .into_iter()
            .enumerate()
            .map(|(rank, c)| RankedEntry {
                rank,
                record: c.record,
            })
            .collect()
    }
}
