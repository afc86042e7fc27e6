//! Position-shifting view over a transition stream.

use crate::error::{CountsError, Result};
use crate::transition::{Transition, TransitionStream};

/// Reports every position of the wrapped stream shifted by `offset`.
///
/// With a negative offset, runs that end at or before position 0 are dropped
/// and a run crossing 0 is trimmed to start there. `reposition` targets are
/// shifted back before being handed to the wrapped stream. Changing the offset
/// only affects later calls.
pub struct OffsetView<S> {
    inner: S,
    offset: i64,
    /// Unshifted run read ahead by `has_next`.
    pending: Option<Transition>,
    /// Unshifted run last returned by `next_transition`.
    last: Transition,
}

impl<S: TransitionStream> OffsetView<S> {
    pub fn new(inner: S, offset: i64) -> Self {
        Self {
            inner,
            offset,
            pending: None,
            last: Transition::default(),
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Shift a run, clipping whatever falls left of position 0.
    /// `None` when nothing of the run is left.
    fn clip(&self, mut transition: Transition) -> Option<Transition> {
        let start = i128::from(transition.position) + i128::from(self.offset);
        let end = start + i128::from(transition.length);
        if end <= 0 {
            return None;
        }
        if start < 0 {
            // end < length here, so it fits
            transition.length = u32::try_from(end).ok()?;
            transition.position = 0;
        } else {
            transition.position = u64::try_from(start).unwrap_or(u64::MAX);
        }
        Some(transition)
    }

    #[inline]
    fn unshift(&self, position: u64) -> u64 {
        if self.offset >= 0 {
            position.saturating_sub(self.offset as u64)
        } else {
            position.saturating_add(self.offset.unsigned_abs())
        }
    }
}

impl<S: TransitionStream> TransitionStream for OffsetView<S> {
    fn has_next(&mut self) -> Result<bool> {
        loop {
            if let Some(pending) = self.pending {
                if self.clip(pending).is_some() {
                    return Ok(true);
                }
                self.pending = None;
            }
            if !self.inner.has_next()? {
                return Ok(false);
            }
            self.pending = Some(self.inner.next_transition()?);
        }
    }

    fn next_transition(&mut self) -> Result<Transition> {
        if !self.has_next()? {
            return Err(CountsError::NoMoreTransitions);
        }
        let raw = self.pending.take().ok_or(CountsError::NoMoreTransitions)?;
        self.last = raw;
        self.clip(raw).ok_or(CountsError::NoMoreTransitions)
    }

    fn current(&self) -> Transition {
        self.clip(self.last).unwrap_or(Transition {
            position: 0,
            length: 0,
            ..self.last
        })
    }

    fn close(&mut self) -> Result<()> {
        self.pending = None;
        self.inner.close()
    }

    fn reposition(&mut self, position: u64) -> Result<()> {
        let target = self.unshift(position);
        self.inner.reposition(target)?;
        self.pending = None;
        Ok(())
    }
}
