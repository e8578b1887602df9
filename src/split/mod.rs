//! Chunk splitting
//!
//! Records are partitioned into fixed-size chunks in their existing order.
//! For N records and a chunk size of S there are ceil(N / S) chunks; every
//! chunk but the last holds exactly S records.

mod groups;

pub use groups::{AttributeGroup, group_by_field, sanitize_file_component};

use crate::models::PropertyRecord;

/// An ordered, bounded run of records written to one output file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a> {
    /// Zero-based chunk position
    pub index: usize,
    pub records: &'a [PropertyRecord],
}

impl Chunk<'_> {
    /// File stem, `chunk_001` for the first chunk
    pub fn name(&self) -> String {
        format!("chunk_{:03}", self.index + 1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Deterministic fixed-size splitter
#[derive(Debug, Clone, Copy)]
pub struct ChunkSplitter {
    records_per_file: usize,
}

impl ChunkSplitter {
    /// `records_per_file` of zero is treated as one
    pub fn new(records_per_file: usize) -> Self {
        Self {
            records_per_file: records_per_file.max(1),
        }
    }

    pub fn records_per_file(&self) -> usize {
        self.records_per_file
    }

    /// Number of chunks `split` yields for `total` records
    pub fn chunk_count(&self, total: usize) -> usize {
        total.div_ceil(self.records_per_file)
    }

    /// Split records into chunks without reordering or deduplication
    pub fn split<'a>(&self, records: &'a [PropertyRecord]) -> Vec<Chunk<'a>> {
        records
            .chunks(self.records_per_file)
            .enumerate()
            .map(|(index, records)| Chunk { index, records })
            .collect()
    }
}

/// Stable sort by address; records without an address keep their relative
/// order after all addressed ones.
pub fn sort_by_address(records: &mut [PropertyRecord]) {
    records.sort_by(|a, b| match (&a.address, &b.address) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
