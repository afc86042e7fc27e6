//! Streaming BED file parser for reads and gene models.
//!
//! Fields are located with memchr; the line buffer is reused between records.

use crate::annotation::{Annotation, Segment};
use crate::error::{CountsError, Result};
use crate::interval::{BedRecord, Strand};
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Fast u64 parsing: digits only, no allocation.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 20 {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

/// Tab-separated fields of one line.
struct Fields<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        match memchr(b'\t', rest) {
            Some(tab) => {
                self.rest = Some(&rest[tab + 1..]);
                Some(&rest[..tab])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

#[inline]
fn fields(line: &[u8]) -> Fields<'_> {
    Fields { rest: Some(line) }
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    while let [head @ .., b'\n' | b'\r'] = line {
        line = head;
    }
    line
}

fn parse_list(field: &[u8]) -> Option<Vec<u64>> {
    field
        .split(|&b| b == b',')
        .filter(|s| !s.is_empty())
        .map(parse_u64_fast)
        .collect()
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 256 * 1024)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Line number of the last record read (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next BED record.
    pub fn read_record(&mut self) -> Result<Option<BedRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = trim_line_end(&self.buffer);
            if should_skip_line(line) {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
    }

    /// Read the next record as a gene model.
    ///
    /// BED12 blocks become the exons; without blocks the whole record is a
    /// single exon. Records without a name are named after their location.
    pub fn read_annotation(&mut self) -> Result<Option<Annotation>> {
        let Some(record) = self.read_record()? else {
            return Ok(None);
        };
        let blocks = record
            .blocks()
            .ok_or_else(|| self.error("exon block overflows u64"))?;
        let mut segments = Vec::with_capacity(blocks.len());
        for (start, end) in blocks {
            if end <= start {
                return Err(self.error("empty exon block"));
            }
            let start = self.coordinate(start)?;
            let end = self.coordinate(end - 1)?;
            segments.push(Segment::new(start, end));
        }
        let id = match record.name {
            Some(ref name) => name.clone(),
            None => format!("{}:{}-{}", record.chrom(), record.start(), record.end()),
        };
        Ok(Some(Annotation::new(
            id,
            record.chrom(),
            record.strand.unwrap_or_default(),
            segments,
        )))
    }

    fn error(&self, message: impl Into<String>) -> CountsError {
        CountsError::Parse {
            line: self.line_number,
            message: message.into(),
        }
    }

    fn coordinate(&self, value: u64) -> Result<u32> {
        u32::try_from(value)
            .map_err(|_| self.error(format!("Position {} exceeds 32 bits", value)))
    }

    fn parse_line(&self, line: &[u8]) -> Result<BedRecord> {
        let mut columns = fields(line);
        let (Some(chrom), Some(start), Some(end)) = (columns.next(), columns.next(), columns.next())
        else {
            return Err(self.error("Expected at least 3 fields"));
        };

        let chrom = std::str::from_utf8(chrom)
            .map_err(|_| self.error("Chromosome name is not UTF-8"))?;
        let start = self.parse_position(start, "start")?;
        let end = self.parse_position(end, "end")?;
        if start > end {
            return Err(self.error(format!("Start ({}) > end ({})", start, end)));
        }

        let mut record = BedRecord::new(chrom, start, end);
        for (column, field) in columns.enumerate() {
            match column {
                0 => record.name = Some(String::from_utf8_lossy(field).into_owned()),
                1 => {
                    record.score = std::str::from_utf8(field)
                        .ok()
                        .and_then(|s| s.parse().ok())
                }
                2 => record.strand = field.first().map(|&b| Strand::from_char(b as char)),
                // thickStart, thickEnd, itemRgb, blockCount
                3..=6 => {}
                7 => record.block_sizes = Some(self.parse_blocks(field, "blockSizes")?),
                8 => record.block_starts = Some(self.parse_blocks(field, "blockStarts")?),
                _ => break,
            }
        }

        if let (Some(sizes), Some(starts)) = (&record.block_sizes, &record.block_starts) {
            if sizes.len() != starts.len() {
                return Err(self.error(format!(
                    "{} block sizes but {} block starts",
                    sizes.len(),
                    starts.len()
                )));
            }
        }
        Ok(record)
    }

    fn parse_position(&self, field: &[u8], name: &str) -> Result<u64> {
        parse_u64_fast(field).ok_or_else(|| {
            self.error(format!(
                "Invalid {} position: '{}'",
                name,
                String::from_utf8_lossy(field)
            ))
        })
    }

    fn parse_blocks(&self, field: &[u8], name: &str) -> Result<Vec<u64>> {
        parse_list(field).ok_or_else(|| {
            self.error(format!(
                "Invalid {}: '{}'",
                name,
                String::from_utf8_lossy(field)
            ))
        })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<BedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Read all BED records from a file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<BedRecord>> {
    BedReader::from_path(path)?.records().collect()
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<BedRecord>> {
    BedReader::new(content.as_bytes()).records().collect()
}

/// Read gene models from a BED6 or BED12 file.
pub fn read_annotations<P: AsRef<Path>>(path: P) -> Result<Vec<Annotation>> {
    collect_annotations(BedReader::from_path(path)?)
}

/// Parse gene models from a string.
pub fn parse_annotations(content: &str) -> Result<Vec<Annotation>> {
    collect_annotations(BedReader::new(content.as_bytes()))
}

fn collect_annotations<R: Read>(mut reader: BedReader<R>) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();
    while let Some(annotation) = reader.read_annotation()? {
        annotations.push(annotation);
    }
    Ok(annotations)
}
