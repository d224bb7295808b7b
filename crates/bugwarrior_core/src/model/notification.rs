//! Notification and sync statistics values.
//!
//! # Invariants
//! - `Notification` is immutable after construction and compared by value.
//! - `SyncStats` keeps counters in insertion order.

use std::path::PathBuf;

/// One desktop notification, built fresh for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub summary: String,
    pub body: String,
    pub icon: PathBuf,
    pub sticky: bool,
}

/// Ordered counters produced by a finished sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    counters: Vec<(String, u64)>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a counter, keeping the position of an existing one.
    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        let name = name.into();
        match self.counters.iter_mut().find(|(key, _)| *key == name) {
            Some((_, count)) => *count = value,
            None => self.counters.push((name, value)),
        }
    }

    /// Adds one to a counter, appending it when first seen.
    pub fn increment(&mut self, name: &str) {
        match self.counters.iter_mut().find(|(key, _)| key == name) {
            Some((_, count)) => *count += 1,
            None => self.counters.push((name.to_string(), 1)),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for SyncStats {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        let mut stats = Self::new();
        for (name, value) in iter {
            stats.set(name, value);
        }
        stats
    }
}
