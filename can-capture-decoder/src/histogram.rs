//! Per-identifier frame counts

use crate::types::Frame;
use std::collections::BTreeMap;
use std::fmt;

/// Frame counts keyed by identifier, iterated in ascending identifier order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdHistogram {
    counts: BTreeMap<u16, usize>,
    total: usize,
}

impl IdHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame: &Frame) {
        *self.counts.entry(frame.id).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, id: u16) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Total frames recorded
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct identifiers seen
    pub fn unique_ids(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, usize)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }
}

impl<'a> FromIterator<&'a Frame> for IdHistogram {
    fn from_iter<T: IntoIterator<Item = &'a Frame>>(iter: T) -> Self {
        let mut histogram = Self::new();
        for frame in iter {
            histogram.record(frame);
        }
        histogram
    }
}

impl fmt::Display for IdHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, count) in self.iter() {
            writeln!(f, "ID: 0x{:03X}, count: {}", id, count)?;
        }
        Ok(())
    }
}
