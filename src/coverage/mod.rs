//! Sparse coverage index over aligned reads.
//!
//! Reads are half-open `[start, end)`. Query ranges are closed `[start, end]`
//! (both ends included), matching how exon and intron boundaries are given.
//!
//! ```
//! use countrun::coverage::SparseCoverageIndex;
//!
//! let mut index = SparseCoverageIndex::new();
//! index.populate(10, 20);
//! index.populate(15, 25);
//! index.accumulate();
//!
//! assert_eq!(index.value_at(17), 2.0);
//! assert_eq!(index.overlap_count(0, 12), 1.0);
//! assert_eq!(index.average_value(10, 14), 1.0);
//! ```

pub mod breakpoints;

pub use breakpoints::{CoverageBreakpointMap, StepFunction};

use crate::annotation::Annotation;

/// One aligned fragment over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Read {
    pub start: u32,
    pub end: u32,
}

impl Read {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// How much one read contributes to counts, chosen once per index.
#[derive(Debug, Clone, Default)]
pub enum CountingStrategy {
    /// Every read counts 1.
    #[default]
    Unweighted,
    /// Read `i` counts `weights[i]` (1.0 when no weight is known).
    Weighted { weights: Vec<f32> },
}

impl CountingStrategy {
    #[inline]
    pub fn weight(&self, query_index: usize) -> f64 {
        match self {
            CountingStrategy::Unweighted => 1.0,
            CountingStrategy::Weighted { weights } => {
                weights.get(query_index).map_or(1.0, |&w| w as f64)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WeightedRead {
    read: Read,
    weight: f64,
}

/// Piecewise-constant coverage built from reads, with point and range queries.
///
/// Populate with reads, call [`SparseCoverageIndex::accumulate`], then query.
/// Queries on an index that was never accumulated see no reads.
#[derive(Debug, Clone, Default)]
pub struct SparseCoverageIndex {
    counter: CoverageBreakpointMap,
    reads: Vec<WeightedRead>,
    strategy: CountingStrategy,
    skipped: usize,
}

impl SparseCoverageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: CountingStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> &CountingStrategy {
        &self.strategy
    }

    /// Add a read. Empty or inverted reads are ignored.
    #[inline]
    pub fn populate(&mut self, start: u32, end: u32) {
        self.add(start, end, 1.0);
    }

    /// Add a read identified by `query_index`, weighted by the strategy.
    #[inline]
    pub fn populate_query(&mut self, start: u32, end: u32, query_index: usize) {
        let weight = self.strategy.weight(query_index);
        self.add(start, end, weight);
    }

    /// Add a read once per unit of multiplicity.
    pub fn populate_with_multiplicity(
        &mut self,
        start: u32,
        end: u32,
        query_index: usize,
        multiplicity: u32,
    ) {
        for _ in 0..multiplicity {
            self.populate_query(start, end, query_index);
        }
    }

    fn add(&mut self, start: u32, end: u32, weight: f64) {
        let read = Read::new(start, end);
        if read.is_empty() {
            self.skipped += 1;
            return;
        }
        self.counter.populate(start, end, weight);
        self.reads.push(WeightedRead { read, weight });
    }

    /// Finalize breakpoints and sort reads by start. Required before queries.
    pub fn accumulate(&mut self) {
        self.counter.accumulate();
        self.reads.sort_unstable_by_key(|r| (r.read.start, r.read.end));
        if self.skipped > 0 {
            log::warn!("ignored {} empty or inverted reads", self.skipped);
        }
    }

    /// Number of reads held.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn breakpoints(&self) -> &CoverageBreakpointMap {
        &self.counter
    }

    /// Coverage depth at `position`.
    #[inline]
    pub fn value_at(&self, position: u32) -> f64 {
        self.counter.coverage().value_at(position)
    }

    /// Total weight of reads starting at or before `position`.
    #[inline]
    pub fn starts_at_or_before(&self, position: u32) -> f64 {
        self.counter.starts().value_at(position)
    }

    /// Total weight of reads ending at or before `position`.
    #[inline]
    pub fn ends_at_or_before(&self, position: u32) -> f64 {
        self.counter.ends().value_at(position)
    }

    /// Mean depth per base over `[start, end]`; 0 when `end < start`.
    ///
    /// Sums depth times run length over the runs inside the window, removes
    /// the part of the first run lying before `start` and adds back the part
    /// of the last run up to and including `end`.
    pub fn average_value(&self, start: u32, end: u32) -> f64 {
        let coverage = self.counter.coverage();
        if end < start || coverage.is_empty() {
            return 0.0;
        }
        let keys = coverage.keys();
        let values = coverage.values();

        let start_index = coverage.floor_index(start);
        let start_key = keys[start_index];
        let start_over = (start as f64 - start_key as f64) * values[start_index];

        let max_index = keys.len() - 1;
        let mut end_index = max_index;
        let mut sum = 0.0;
        let mut index = start_index;
        while index < max_index {
            let next_key = keys[index + 1];
            if next_key > end {
                end_index = index;
                break;
            }
            sum += values[index] * (next_key - keys[index]) as f64;
            index += 1;
        }

        let end_key = keys[end_index];
        let end_under = (end as f64 - end_key as f64 + 1.0) * values[end_index];
        let segment = end as f64 - start as f64 + 1.0;
        (sum - start_over + end_under) / segment
    }

    /// Weight of reads overlapping `[start, end]` by at least one base:
    /// reads starting at or before `end` minus reads already over by `start`.
    pub fn overlap_count(&self, start: u32, end: u32) -> f64 {
        if end < start {
            return 0.0;
        }
        (self.starts_at_or_before(end) - self.ends_at_or_before(start)).max(0.0)
    }

    /// Weight of reads lying entirely inside `[start, end]`.
    pub fn strictly_contained_count(&self, start: u32, end: u32) -> f64 {
        if end < start {
            return 0.0;
        }
        let first = self.reads.partition_point(|r| r.read.start < start);
        let limit = end as u64 + 1;
        let mut count = 0.0;
        for r in &self.reads[first..] {
            if r.read.start > end {
                break;
            }
            if r.read.end as u64 <= limit {
                count += r.weight;
            }
        }
        count
    }

    /// Reads overlapping the gene minus reads falling wholly inside one of
    /// its introns.
    pub fn gene_expression(&self, annotation: &Annotation) -> f64 {
        if annotation.segments().is_empty() {
            return 0.0;
        }
        let mut sum = self.overlap_count(annotation.start(), annotation.end());
        for intron in annotation.introns() {
            sum -= self.strictly_contained_count(intron.start, intron.end);
        }
        sum
    }

    /// The coverage function as `(start, length, depth)` runs, from position 0
    /// to the last read end. Neighbouring runs always differ in depth.
    pub fn runs(&self) -> Vec<(u32, u32, f64)> {
        let coverage = self.counter.coverage();
        let keys = coverage.keys();
        let values = coverage.values();
        let mut runs: Vec<(u32, u32, f64)> = Vec::with_capacity(keys.len());
        for (window, &value) in keys.windows(2).zip(values) {
            let (start, next) = (window[0], window[1]);
            match runs.last_mut() {
                Some(last) if last.2 == value => last.1 += next - start,
                _ => runs.push((start, next - start, value)),
            }
        }
        runs
    }
}
