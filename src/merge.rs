//! Sweep-line merge of several transition streams.
//!
//! The merged stream reports a transition wherever any input changes value
//! and nowhere else. Its count is the sum of the counts of the inputs whose
//! loaded run covers the output position.
//!
//! Algorithm:
//! 1. Every input holds at most one loaded run `[start, end)`.
//! 2. The start and end of every loaded run go into an ordered breakpoint set.
//! 3. Before each output run, inputs whose run ended at or before the sweep
//!    position load their next run (or are marked finished).
//! 4. The output run spans the two smallest breakpoints; the smaller one is
//!    then removed from the set.

use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use crate::transition::{Transition, TransitionStream};
use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Unbounded};

/// Marks a slot that never loaded a run.
const UNLOADED: u64 = u64::MAX;

/// The run currently loaded from one input.
#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    start: u64,
    end: u64,
    count: i64,
    finished: bool,
}

impl ActiveRun {
    fn unloaded() -> Self {
        Self {
            start: UNLOADED,
            end: UNLOADED,
            count: 0,
            finished: false,
        }
    }

    /// Needs its next run once the sweep reaches its end.
    #[inline]
    fn needs_loading(&self, sweep: u64) -> bool {
        !self.finished && (self.end == UNLOADED || self.end <= sweep)
    }

    /// Left-inclusive, right-exclusive.
    #[inline]
    fn in_range(&self, position: u64) -> bool {
        self.start != UNLOADED
            && (self.start == position || (self.start <= position && self.end > position))
    }
}

/// Merges N transition streams into one whose transitions fall on the union
/// of all input boundaries.
///
/// Gaps where no input has a loaded run are reported with a count of zero.
/// `reposition` is not supported.
pub struct StreamMerger<S> {
    streams: Vec<S>,
    runs: Vec<ActiveRun>,
    breakpoints: BTreeSet<u64>,
    position: u64,
    length: u32,
    loaded: bool,
    previous_count: i64,
    current: Transition,
}

impl<S: TransitionStream> StreamMerger<S> {
    pub fn new(streams: Vec<S>) -> Self {
        Self::with_config(streams, &CountsConfig::default())
    }

    /// Deltas of the merged stream start from `config.initial_count`.
    pub fn with_config(streams: Vec<S>, config: &CountsConfig) -> Self {
        let runs = vec![ActiveRun::unloaded(); streams.len()];
        log::debug!("merging {} count streams", streams.len());
        Self {
            streams,
            runs,
            breakpoints: BTreeSet::new(),
            position: 0,
            length: 0,
            loaded: false,
            previous_count: config.initial_count,
            current: Transition::default(),
        }
    }

    pub fn streams(&self) -> &[S] {
        &self.streams
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Count contributed by input `stream_index` at the current output position.
    pub fn count_of(&self, stream_index: usize) -> i64 {
        match self.runs.get(stream_index) {
            Some(run) if run.in_range(self.position) => run.count,
            _ => 0,
        }
    }

    fn merged_count(&self) -> i64 {
        (0..self.runs.len()).map(|i| self.count_of(i)).sum()
    }

    fn load_runs(&mut self, sweep: u64) -> Result<()> {
        for (stream, run) in self.streams.iter_mut().zip(self.runs.iter_mut()) {
            if !run.needs_loading(sweep) {
                continue;
            }
            if stream.has_next()? {
                let transition = stream.next_transition()?;
                run.start = transition.position;
                run.end = transition.end();
                run.count = transition.count;
                self.breakpoints.insert(run.start);
                self.breakpoints.insert(run.end);
            } else {
                run.finished = true;
            }
        }
        Ok(())
    }
}

impl<S: TransitionStream> TransitionStream for StreamMerger<S> {
    fn has_next(&mut self) -> Result<bool> {
        if self.loaded {
            return Ok(true);
        }
        let sweep = self.breakpoints.first().copied().unwrap_or(UNLOADED);
        self.load_runs(sweep)?;

        let Some(&first) = self.breakpoints.first() else {
            return Ok(false);
        };
        let Some(&second) = self.breakpoints.range((Excluded(first), Unbounded)).next() else {
            return Ok(false);
        };
        let length = match u32::try_from(second - first) {
            Ok(length) => length,
            Err(_) => {
                // Split gaps too long for one run.
                self.breakpoints.insert(first + u32::MAX as u64);
                u32::MAX
            }
        };
        self.breakpoints.remove(&first);
        self.position = first;
        self.length = length;
        self.loaded = true;
        Ok(true)
    }

    fn next_transition(&mut self) -> Result<Transition> {
        if !self.has_next()? {
            return Err(CountsError::NoMoreTransitions);
        }
        self.loaded = false;
        let count = self.merged_count();
        self.current = Transition::new(
            self.position,
            self.length,
            count,
            count - self.previous_count,
        );
        self.previous_count = count;
        Ok(self.current)
    }

    fn current(&self) -> Transition {
        self.current
    }

    fn reposition(&mut self, _position: u64) -> Result<()> {
        Err(CountsError::UnsupportedOperation(
            "a stream merger cannot be repositioned",
        ))
    }

    fn close(&mut self) -> Result<()> {
        for stream in &mut self.streams {
            stream.close()?;
        }
        self.breakpoints.clear();
        Ok(())
    }
}
