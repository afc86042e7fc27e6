//! BED record and strand types.

/// A BED record in 0-based, half-open coordinates. Columns past BED3 are
/// kept only when present.
///
/// Reads use the score column as their weight; gene models use the name,
/// strand and BED12 block columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BedRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: Option<String>,
    pub score: Option<f64>,
    pub strand: Option<Strand>,
    pub block_sizes: Option<Vec<u64>>,
    pub block_starts: Option<Vec<u64>>,
}

impl BedRecord {
    /// Create a minimal BED3 record.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            name: None,
            score: None,
            strand: None,
            block_sizes: None,
            block_starts: None,
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Weight of this record as a read: its score, or 1.0 without one.
    #[inline]
    pub fn weight(&self) -> f32 {
        self.score.map_or(1.0, |s| s as f32)
    }

    /// Exon blocks as absolute half-open `(start, end)` pairs, or the whole
    /// record as one block when it carries no block columns.
    ///
    /// `None` if a block lies past `u64::MAX`.
    pub fn blocks(&self) -> Option<Vec<(u64, u64)>> {
        match (&self.block_sizes, &self.block_starts) {
            (Some(sizes), Some(starts)) if !sizes.is_empty() => starts
                .iter()
                .zip(sizes)
                .map(|(&offset, &size)| {
                    let start = self.start.checked_add(offset)?;
                    Some((start, start.checked_add(size)?))
                })
                .collect(),
            _ => Some(vec![(self.start, self.end)]),
        }
    }
}

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Plus,
    Minus,
    #[default]
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}
