//! Sparse difference-array accumulation of read starts and ends.
//!
//! Reads add their weight at their start key and at their end key. Once
//! [`CoverageBreakpointMap::accumulate`] has run, three sorted key lists
//! answer step-function lookups by binary search:
//!
//! - `starts`: total weight of reads starting at or before the key
//! - `ends`: total weight of reads ending at or before the key
//! - `coverage`: depth over `[key, next key)`
//!
//! Every list carries a key at position 0, so each position has a key at or
//! before it.

use rustc_hash::FxHashMap;

/// Sorted keys with the value holding from each key up to the next one.
#[derive(Debug, Clone, Default)]
pub struct StepFunction {
    keys: Vec<u32>,
    values: Vec<f64>,
}

impl StepFunction {
    /// Build from per-key increments, prefix-summing them in key order.
    fn cumulative(increments: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut entries: Vec<(u32, f64)> = increments.into_iter().collect();
        entries.sort_unstable_by_key(|&(key, _)| key);
        if entries.first().is_none_or(|&(key, _)| key != 0) {
            entries.insert(0, (0, 0.0));
        }

        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        let mut total = 0.0;
        for (key, increment) in entries {
            total += increment;
            keys.push(key);
            values.push(total);
        }
        Self { keys, values }
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the greatest key at or before `position`, clamped to 0.
    #[inline]
    pub fn floor_index(&self, position: u32) -> usize {
        match self.keys.binary_search(&position) {
            Ok(index) => index,
            Err(insertion) => insertion.saturating_sub(1),
        }
    }

    /// Value at `position`: the value stored at the greatest key at or
    /// before it. An empty function is 0 everywhere.
    #[inline]
    pub fn value_at(&self, position: u32) -> f64 {
        if self.keys.is_empty() {
            return 0.0;
        }
        self.values[self.floor_index(position)]
    }
}

/// Start/end breakpoint maps of a set of reads.
#[derive(Debug, Clone, Default)]
pub struct CoverageBreakpointMap {
    start_increments: FxHashMap<u32, f64>,
    end_increments: FxHashMap<u32, f64>,
    starts: StepFunction,
    ends: StepFunction,
    coverage: StepFunction,
    accumulated: bool,
}

impl CoverageBreakpointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read over `[start, end)` contributing `weight`.
    #[inline]
    pub fn populate(&mut self, start: u32, end: u32, weight: f64) {
        *self.start_increments.entry(start).or_insert(0.0) += weight;
        *self.end_increments.entry(end).or_insert(0.0) += weight;
        self.accumulated = false;
    }

    /// Build the sorted cumulative lists. Safe to call again after more
    /// reads were populated.
    pub fn accumulate(&mut self) {
        self.starts = StepFunction::cumulative(
            self.start_increments.iter().map(|(&k, &v)| (k, v)),
        );
        self.ends = StepFunction::cumulative(self.end_increments.iter().map(|(&k, &v)| (k, v)));

        let mut depth_changes: FxHashMap<u32, f64> = self.start_increments.clone();
        for (&key, &weight) in &self.end_increments {
            *depth_changes.entry(key).or_insert(0.0) -= weight;
        }
        self.coverage = StepFunction::cumulative(depth_changes);
        self.accumulated = true;

        log::debug!(
            "accumulated {} start keys, {} end keys, {} coverage keys",
            self.starts.len(),
            self.ends.len(),
            self.coverage.len()
        );
    }

    pub fn is_accumulated(&self) -> bool {
        self.accumulated
    }

    pub fn starts(&self) -> &StepFunction {
        &self.starts
    }

    pub fn ends(&self) -> &StepFunction {
        &self.ends
    }

    pub fn coverage(&self) -> &StepFunction {
        &self.coverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CoverageBreakpointMap {
        let mut map = CoverageBreakpointMap::new();
        map.populate(10, 20, 1.0);
        map.populate(15, 30, 1.0);
        map.populate(15, 20, 1.0);
        map.accumulate();
        map
    }

    #[test]
    fn test_cumulative_starts_and_ends() {
        let map = sample();
        assert_eq!(map.starts().keys(), &[0, 10, 15]);
        assert_eq!(map.starts().values(), &[0.0, 1.0, 3.0]);
        assert_eq!(map.ends().keys(), &[0, 20, 30]);
        assert_eq!(map.ends().values(), &[0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_coverage_steps() {
        let map = sample();
        let coverage = map.coverage();
        assert_eq!(coverage.keys(), &[0, 10, 15, 20, 30]);
        assert_eq!(coverage.values(), &[0.0, 1.0, 3.0, 1.0, 0.0]);
        assert_eq!(coverage.value_at(9), 0.0);
        assert_eq!(coverage.value_at(10), 1.0);
        assert_eq!(coverage.value_at(19), 3.0);
        assert_eq!(coverage.value_at(25), 1.0);
        assert_eq!(coverage.value_at(1_000), 0.0);
    }

    #[test]
    fn test_read_at_position_zero() {
        let mut map = CoverageBreakpointMap::new();
        map.populate(0, 4, 2.0);
        map.accumulate();
        assert_eq!(map.coverage().keys(), &[0, 4]);
        assert_eq!(map.coverage().value_at(0), 2.0);
        assert_eq!(map.starts().value_at(0), 2.0);
    }

    #[test]
    fn test_empty_map() {
        let map = CoverageBreakpointMap::new();
        assert!(!map.is_accumulated());
        assert_eq!(map.coverage().value_at(5), 0.0);
    }
}
