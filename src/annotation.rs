//! Gene annotations as ordered exon segments.

use crate::interval::Strand;
use std::fmt;

/// An exon in closed coordinates: both `start` and `end` belong to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
}

impl Segment {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of bases covered, 0 when `end < start`.
    #[inline]
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            u64::from(self.end - self.start) + 1
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// A gene (or transcript) on one chromosome with its exons in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub id: String,
    pub chrom: String,
    pub strand: Strand,
    segments: Vec<Segment>,
}

impl Annotation {
    /// Create an annotation; segments are sorted by start.
    pub fn new(
        id: impl Into<String>,
        chrom: impl Into<String>,
        strand: Strand,
        mut segments: Vec<Segment>,
    ) -> Self {
        segments.sort_unstable();
        Self {
            id: id.into(),
            chrom: chrom.into(),
            strand,
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start of the first exon (0 with no exons).
    pub fn start(&self) -> u32 {
        self.segments.first().map_or(0, |s| s.start)
    }

    /// End of the last exon, inclusive.
    pub fn end(&self) -> u32 {
        self.segments.iter().map(|s| s.end).max().unwrap_or(0)
    }

    /// Gaps between consecutive exons, in closed coordinates. Touching or
    /// overlapping exons leave no gap.
    pub fn introns(&self) -> impl Iterator<Item = Segment> + '_ {
        self.segments.windows(2).filter_map(|pair| {
            let start = pair[0].end.checked_add(1)?;
            let end = pair[1].start.checked_sub(1)?;
            (start <= end).then(|| Segment::new(start, end))
        })
    }

    /// Total exon length in bases.
    pub fn exon_length(&self) -> u64 {
        self.segments.iter().map(Segment::len).sum()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.id,
            self.chrom,
            self.start(),
            self.end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_introns() {
        let annotation = Annotation::new(
            "g1",
            "chr1",
            Strand::Plus,
            vec![Segment::new(200, 299), Segment::new(100, 149)],
        );
        assert_eq!(annotation.start(), 100);
        assert_eq!(annotation.end(), 299);
        let introns: Vec<Segment> = annotation.introns().collect();
        assert_eq!(introns, vec![Segment::new(150, 199)]);
        assert_eq!(annotation.exon_length(), 150);
    }

    #[test]
    fn test_adjacent_exons_have_no_intron() {
        let annotation = Annotation::new(
            "g2",
            "chr1",
            Strand::Unknown,
            vec![Segment::new(10, 19), Segment::new(20, 29)],
        );
        assert_eq!(annotation.introns().count(), 0);
    }

    #[test]
    fn test_segment_len() {
        assert_eq!(Segment::new(5, 5).len(), 1);
        assert_eq!(Segment::new(0, u32::MAX).len(), 1 << 32);
        let empty = Segment::new(10, 9);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
    }
}
