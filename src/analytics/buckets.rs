//! Insertion-ordered accumulators used by the aggregation fold.

use std::collections::HashMap;
use std::hash::Hash;

/// Running totals for one bucket. Never rounded; rounding happens on output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub hours: f64,
    pub billable_hours: f64,
    pub tasks: u32,
}

impl Accumulator {
    pub fn add(&mut self, hours: f64, billable: bool) {
        self.hours += hours;
        if billable {
            self.billable_hours += hours;
        }
        self.tasks += 1;
    }
}

#[derive(Debug, Clone)]
pub struct Bucket {
    pub label: String,
    /// Lower is better; a later record with a better-ranked label replaces it.
    label_rank: u8,
    pub totals: Accumulator,
}

/// A bucket map that remembers first-seen order.
#[derive(Debug, Clone)]
pub struct BucketMap<K> {
    index: HashMap<K, usize>,
    entries: Vec<Bucket>,
}

impl<K: Eq + Hash> Default for BucketMap<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash> BucketMap<K> {
    /// Return the totals for `key`, opening the bucket with `label` if new.
    pub fn bucket(&mut self, key: K, label: &str) -> &mut Accumulator {
        self.ranked_bucket(key, label, 0)
    }

    /// Like `bucket`, but an existing label is replaced when `rank` beats it.
    pub fn ranked_bucket(&mut self, key: K, label: &str, rank: u8) -> &mut Accumulator {
        let idx = match self.index.get(&key) {
            Some(&idx) => {
                let entry = &mut self.entries[idx];
                if rank < entry.label_rank {
                    entry.label = label.to_string();
                    entry.label_rank = rank;
                }
                idx
            }
            None => {
                let idx = self.entries.len();
                self.entries.push(Bucket {
                    label: label.to_string(),
                    label_rank: rank,
                    totals: Accumulator::default(),
                });
                self.index.insert(key, idx);
                idx
            }
        };
        &mut self.entries[idx].totals
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buckets in first-seen order.
    pub fn into_buckets(self) -> Vec<Bucket> {
        self.entries
    }

    /// Buckets sorted by hours, descending. Stable, so ties keep first-seen order.
    pub fn into_sorted_by_hours(self) -> Vec<Bucket> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.totals.hours.total_cmp(&a.totals.hours));
        entries
    }
}

/// Round to cents. Applied once, on the output record.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
