//! Allocation dump parser and indices.
//!
//! Records are blank-line separated blocks of `key: value` lines:
//!
//! ```text
//! size: 4096
//! hash: 7f3a
//! addr: 0x55d0c0
//! object: Texture
//! frame: 12
//! ```
//!
//! Unknown keys are ignored, a missing `size` counts as 0 and a missing
//! `frame` leaves the record without a frame index.

use super::schema::AllocationRecord;
use crate::utils::error::ParseError;
use log::debug;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Parsed allocation records plus lookups by frame and by stack id
///
/// Both indices keep records in dump order.
#[derive(Debug, Clone, Default)]
pub struct AllocationIndex {
    records: Vec<AllocationRecord>,
    by_frame: BTreeMap<i64, Vec<usize>>,
    by_hash: IndexMap<String, Vec<usize>>,
}

/// Aggregate size statistics over all records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeStatistics {
    pub total_size: u64,
    pub total_count: usize,
    pub unique_stacks: usize,
    /// Absent when there are no records
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    /// Integer division of total by count
    pub avg_size: Option<u64>,
}

impl AllocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records already in memory
    pub fn from_records(records: impl IntoIterator<Item = AllocationRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.push(record);
        }
        index
    }

    /// Append a record and update both indices
    pub fn push(&mut self, record: AllocationRecord) {
        let position = self.records.len();
        if let Some(frame) = record.frame {
            self.by_frame.entry(frame).or_default().push(position);
        }
        self.by_hash
            .entry(record.hash_id.clone())
            .or_default()
            .push(position);
        self.records.push(record);
    }

    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All allocations recorded in `frame`
    pub fn frame_allocations(&self, frame: i64) -> Vec<&AllocationRecord> {
        self.lookup(self.by_frame.get(&frame))
    }

    /// All allocations made from stack `hash_id`
    pub fn hash_allocations(&self, hash_id: &str) -> Vec<&AllocationRecord> {
        self.lookup(self.by_hash.get(hash_id))
    }

    /// Stack ids in order of their first allocation
    pub fn hash_ids(&self) -> impl Iterator<Item = &String> {
        self.by_hash.keys()
    }

    /// Number of allocations made from stack `hash_id`
    pub fn hash_count(&self, hash_id: &str) -> usize {
        self.by_hash.get(hash_id).map_or(0, Vec::len)
    }

    pub fn frame_total_size(&self, frame: i64) -> u64 {
        self.frame_allocations(frame)
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.size))
    }

    pub fn hash_total_size(&self, hash_id: &str) -> u64 {
        self.hash_allocations(hash_id)
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.size))
    }

    /// Smallest and largest frame index seen, `(0, 0)` when none
    pub fn frame_range(&self) -> (i64, i64) {
        match (
            self.by_frame.keys().next(),
            self.by_frame.keys().next_back(),
        ) {
            (Some(&min), Some(&max)) => (min, max),
            _ => (0, 0),
        }
    }

    /// Total size for every frame in `frame_range()`, zero-filled
    pub fn frame_totals(&self) -> BTreeMap<i64, u64> {
        if self.by_frame.is_empty() {
            return BTreeMap::new();
        }
        let (min, max) = self.frame_range();
        (min..=max)
            .map(|frame| (frame, self.frame_total_size(frame)))
            .collect()
    }

    pub fn size_statistics(&self) -> SizeStatistics {
        let total_size = self
            .records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.size));
        let total_count = self.records.len();

        SizeStatistics {
            total_size,
            total_count,
            unique_stacks: self.by_hash.len(),
            min_size: self.records.iter().map(|r| r.size).min(),
            max_size: self.records.iter().map(|r| r.size).max(),
            avg_size: (total_count > 0).then(|| total_size / total_count as u64),
        }
    }

    fn lookup(&self, positions: Option<&Vec<usize>>) -> Vec<&AllocationRecord> {
        positions
            .map(|list| list.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }
}

/// Parse an allocation dump held in memory
pub fn parse_allocations(text: &str) -> AllocationIndex {
    let mut index = AllocationIndex::new();
    let mut fields: HashMap<String, String> = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !fields.is_empty() {
                index.push(create_record(&fields));
                fields.clear();
            }
            continue;
        }

        // Lines without a separator carry nothing we can use.
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    if !fields.is_empty() {
        index.push(create_record(&fields));
    }

    debug!("Parsed {} allocation records", index.len());
    index
}

/// Parse an allocation dump from disk
///
/// # Errors
/// * `ParseError::Unreadable` - the file could not be read
pub fn parse_allocation_file(path: impl AsRef<Path>) -> Result<AllocationIndex, ParseError> {
    let path = path.as_ref();
    debug!("Reading allocation dump: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_allocations(&text))
}

fn create_record(fields: &HashMap<String, String>) -> AllocationRecord {
    let text = |key: &str| fields.get(key).cloned().unwrap_or_default();

    AllocationRecord {
        size: fields
            .get("size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        hash_id: text("hash"),
        address: text("addr"),
        object_type: text("object"),
        frame: fields.get("frame").and_then(|v| v.parse().ok()),
    }
}
