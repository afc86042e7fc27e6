//! Decode command implementation.
//!
//! Prints a counts stream as bedGraph: one `chrom start end count` line per run.

use crate::codec::CountsReader;
use crate::error::Result;
use crate::output::TsvWriter;
use crate::transition::TransitionStream;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Runs and bases written by a bedGraph export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub runs_read: usize,
    pub runs_written: usize,
    pub bases: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs_read={} runs_written={} bases={}",
            self.runs_read, self.runs_written, self.bases
        )
    }
}

/// Label used for a stream when no chromosome name is given: the file stem.
pub fn chrom_label(path: &Path, chrom: Option<&str>) -> String {
    match chrom {
        Some(chrom) => chrom.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chrom".to_string()),
    }
}

/// Write every run of `stream` as bedGraph. Zero-count runs are written
/// only with `report_zero`.
pub fn write_bedgraph<S, W>(
    chrom: &str,
    stream: &mut S,
    report_zero: bool,
    output: &mut W,
) -> Result<RunStats>
where
    S: TransitionStream + ?Sized,
    W: Write,
{
    let mut writer = TsvWriter::new(output);
    let mut stats = RunStats::default();
    while stream.has_next()? {
        let transition = stream.next_transition()?;
        stats.runs_read += 1;
        if transition.count == 0 && !report_zero {
            continue;
        }
        writer.write_run(chrom.as_bytes(), &transition)?;
        stats.runs_written += 1;
        stats.bases += transition.length as u64;
    }
    writer.flush()?;
    Ok(stats)
}

/// Decode command configuration.
#[derive(Debug, Clone, Default)]
pub struct DecodeCommand {
    /// Chromosome column; defaults to the input file stem.
    pub chrom: Option<String>,
    /// Also print zero-count runs.
    pub report_zero: bool,
}

impl DecodeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chrom(mut self, chrom: Option<String>) -> Self {
        self.chrom = chrom;
        self
    }

    pub fn with_report_zero(mut self, report_zero: bool) -> Self {
        self.report_zero = report_zero;
        self
    }

    pub fn run<P: AsRef<Path>, W: Write>(&self, input: P, output: &mut W) -> Result<RunStats> {
        let input = input.as_ref();
        let mut reader = CountsReader::open(input)?;
        let chrom = chrom_label(input, self.chrom.as_deref());
        let stats = write_bedgraph(&chrom, &mut reader, self.report_zero, output)?;
        reader.close()?;
        log::info!("decoded {}: {}", input.display(), stats);
        Ok(stats)
    }
}
