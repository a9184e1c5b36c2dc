/// Analysis over scanned records.

pub mod top_files;

pub use top_files::{rank, rank_with, TieBreak, TopN, DEFAULT_TOP_N};
