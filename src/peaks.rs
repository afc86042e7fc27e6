//! Peak detection over a transition stream.
//!
//! A peak is a maximal stretch of consecutive runs whose count is strictly
//! above the detection threshold.

use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use crate::transition::{Transition, TransitionStream};
use std::fmt;

/// A detected peak.
///
/// `count` sums the count of each run composing the peak (one term per run,
/// not per base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Peak {
    pub start: u64,
    pub length: u64,
    pub count: i64,
}

impl Peak {
    /// First position after the peak.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    fn open(transition: &Transition) -> Self {
        Self {
            start: transition.position,
            length: transition.length as u64,
            count: transition.count,
        }
    }

    fn extend(&mut self, transition: &Transition) {
        self.length += transition.length as u64;
        self.count += transition.count;
    }
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start={} length={} count={}",
            self.start, self.length, self.count
        )
    }
}

/// Splits a transition stream into peaks.
///
/// The run that closes a peak is held back rather than dropped, so the next
/// search sees it again (it matters once the threshold is lowered).
pub struct PeakSegmenter<S> {
    stream: S,
    threshold: i64,
    peak: Option<Peak>,
    held: Option<Transition>,
}

impl<S: TransitionStream> PeakSegmenter<S> {
    /// Detect runs with a count above zero.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, &CountsConfig::default())
    }

    pub fn with_config(stream: S, config: &CountsConfig) -> Self {
        Self {
            stream,
            threshold: config.peak_threshold,
            peak: None,
            held: None,
        }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Change the detection threshold. A peak already detected by
    /// `has_next()` keeps the boundaries found under the old threshold.
    pub fn set_threshold(&mut self, threshold: i64) {
        self.threshold = threshold;
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn close(&mut self) -> Result<()> {
        self.peak = None;
        self.held = None;
        self.stream.close()
    }

    fn pull(&mut self) -> Result<Option<Transition>> {
        if let Some(transition) = self.held.take() {
            return Ok(Some(transition));
        }
        if self.stream.has_next()? {
            self.stream.next_transition().map(Some)
        } else {
            Ok(None)
        }
    }

    /// True if another peak exists. Calling it again before `next_peak()`
    /// returns the same answer without reading further.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.peak.is_some() {
            return Ok(true);
        }

        // Searching for the first run above the threshold.
        let mut peak = loop {
            match self.pull()? {
                Some(t) if t.count > self.threshold => break Peak::open(&t),
                Some(_) => continue,
                None => return Ok(false),
            }
        };

        // Inside the peak until a run falls back to the threshold.
        while let Some(t) = self.pull()? {
            if t.count <= self.threshold {
                self.held = Some(t);
                break;
            }
            peak.extend(&t);
        }

        self.peak = Some(peak);
        Ok(true)
    }

    /// Return the pending peak, or fail with [`CountsError::NoMoreElements`].
    pub fn next_peak(&mut self) -> Result<Peak> {
        self.has_next()?;
        self.peak.take().ok_or(CountsError::NoMoreElements)
    }
}

impl<S: TransitionStream> Iterator for PeakSegmenter<S> {
    type Item = Result<Peak>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_peak()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
