//! Transitions of a piecewise-constant count function and the cursor trait
//! every count stream implements.

use crate::error::{CountsError, Result};
use std::fmt;

/// A run of positions sharing one count.
///
/// For every position in `[position, position + length)` the function value is
/// `count`. `delta_count` is `count` minus the count of the previous run (or the
/// stream baseline for the first run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transition {
    pub position: u64,
    pub length: u32,
    pub count: i64,
    pub delta_count: i64,
}

impl Transition {
    #[inline]
    pub fn new(position: u64, length: u32, count: i64, delta_count: i64) -> Self {
        Self {
            position,
            length,
            count,
            delta_count,
        }
    }

    /// First position after the run.
    #[inline]
    pub fn end(&self) -> u64 {
        self.position + self.length as u64
    }

    /// True if `position` lies within the run.
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position >= self.position && position < self.end()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position={} length={} count={} delta={}",
            self.position, self.length, self.count, self.delta_count
        )
    }
}

/// Forward-only cursor over the transitions of a count function.
///
/// Transitions come out in strictly increasing position order, each run
/// starting where the previous one ended. The accessors describe the
/// transition returned by the last `next_transition()` call and hold
/// defaults before the first call.
pub trait TransitionStream {
    /// True if another transition is available. Repeated calls without an
    /// intervening `next_transition()` do not advance the stream.
    fn has_next(&mut self) -> Result<bool>;

    /// Advance to the next transition. Fails with
    /// [`CountsError::NoMoreTransitions`] once the stream is exhausted.
    fn next_transition(&mut self) -> Result<Transition>;

    /// The transition loaded by the last `next_transition()`.
    fn current(&self) -> Transition;

    /// Release the underlying storage.
    fn close(&mut self) -> Result<()>;

    #[inline]
    fn position(&self) -> u64 {
        self.current().position
    }

    #[inline]
    fn length(&self) -> u32 {
        self.current().length
    }

    #[inline]
    fn count(&self) -> i64 {
        self.current().count
    }

    #[inline]
    fn delta_count(&self) -> i64 {
        self.current().delta_count
    }

    /// Advance until the loaded transition starts at or after `position`.
    ///
    /// Costs one `next_transition()` per skipped run.
    fn skip_to(&mut self, position: u64) -> Result<()> {
        while self.has_next()? {
            let transition = self.next_transition()?;
            if transition.position >= position {
                break;
            }
        }
        Ok(())
    }

    /// Reset the stream so that the next transition returned covers
    /// `position`. Streams without random access refuse.
    fn reposition(&mut self, _position: u64) -> Result<()> {
        Err(CountsError::UnsupportedOperation(
            "this stream does not support reposition",
        ))
    }

    /// Iterate over the remaining transitions.
    fn transitions(&mut self) -> Transitions<'_, Self>
    where
        Self: Sized,
    {
        Transitions { stream: self }
    }

    /// Iterate over the remaining positions one base at a time, yielding
    /// `(position, count)`.
    fn per_base(&mut self) -> PerBaseCounts<'_, Self>
    where
        Self: Sized,
    {
        PerBaseCounts {
            stream: self,
            run: None,
            offset: 0,
        }
    }
}

impl<S: TransitionStream + ?Sized> TransitionStream for Box<S> {
    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn next_transition(&mut self) -> Result<Transition> {
        (**self).next_transition()
    }

    fn current(&self) -> Transition {
        (**self).current()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn skip_to(&mut self, position: u64) -> Result<()> {
        (**self).skip_to(position)
    }

    fn reposition(&mut self, position: u64) -> Result<()> {
        (**self).reposition(position)
    }
}

/// Iterator over the transitions of a stream. See [`TransitionStream::transitions`].
pub struct Transitions<'a, S> {
    stream: &'a mut S,
}

impl<S: TransitionStream> Iterator for Transitions<'_, S> {
    type Item = Result<Transition>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stream.has_next() {
            Ok(true) => Some(self.stream.next_transition()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Iterator over individual positions. See [`TransitionStream::per_base`].
pub struct PerBaseCounts<'a, S> {
    stream: &'a mut S,
    run: Option<Transition>,
    offset: u32,
}

impl<S: TransitionStream> Iterator for PerBaseCounts<'_, S> {
    type Item = Result<(u64, i64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(run) = self.run {
                if self.offset < run.length {
                    let position = run.position + self.offset as u64;
                    self.offset += 1;
                    return Some(Ok((position, run.count)));
                }
            }
            match self.stream.has_next() {
                Ok(true) => match self.stream.next_transition() {
                    Ok(run) => {
                        self.run = Some(run);
                        self.offset = 0;
                    }
                    Err(e) => return Some(Err(e)),
                },
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
