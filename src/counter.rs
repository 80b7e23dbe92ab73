//! Frequency counters keyed by observed substrings.

use rustc_hash::FxHashMap;

/// Mapping from substring to the number of times it was observed.
///
/// Absent keys read as zero. Counts only grow through [`SubstringCounter::increment`]
/// and [`SubstringCounter::merge`]; pruning removes entries without touching the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstringCounter {
    counts: FxHashMap<String, usize>,
}

impl SubstringCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of `key`, zero when unobserved.
    #[must_use]
    pub fn get(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Returns true when `key` has an entry.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    /// Adds one occurrence of `key`.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Adds `amount` occurrences of `key`.
    pub fn add(&mut self, key: &str, amount: usize) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += amount;
        } else {
            self.counts.insert(key.to_owned(), amount);
        }
    }

    /// Overwrites the count of `key`; used when restoring a persisted model.
    pub fn insert(&mut self, key: String, count: usize) {
        self.counts.insert(key, count);
    }

    /// Adds every count of `other` into this counter.
    pub fn merge(&mut self, other: Self) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Keeps only entries whose count is strictly greater than `min_count`.
    pub fn retain_above(&mut self, min_count: usize) {
        self.counts.retain(|_, count| *count > min_count);
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true when nothing has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(substring, count)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(key, &count)| (key.as_str(), count))
    }

    /// Iterates over observed substrings in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.counts.keys().map(String::as_str)
    }
}
