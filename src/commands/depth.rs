//! Depth command implementation.
//!
//! Turns BED reads into one counts file per chromosome. Each chromosome is
//! indexed and encoded on its own rayon task.

use crate::bed::read_records;
use crate::codec::CountsWriter;
use crate::config::CountsConfig;
use crate::coverage::SparseCoverageIndex;
use crate::error::{CountsError, Result};
use crate::interval::BedRecord;
use crate::parallel::{build_index, group_records_by_chromosome, process_chromosomes};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of the files written by [`DepthCommand`].
pub const COUNTS_EXTENSION: &str = "counts";

/// One encoded chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthFile {
    pub chrom: String,
    pub path: PathBuf,
    pub records: u64,
    pub bases: u64,
}

impl fmt::Display for DepthFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\trecords={}\tbases={}",
            self.chrom,
            self.path.display(),
            self.records,
            self.bases
        )
    }
}

/// Encode the coverage of an accumulated index, from position 0 to the last
/// read end. Depths are rounded to whole counts.
pub fn encode_index<W: Write>(
    index: &SparseCoverageIndex,
    writer: &mut CountsWriter<W>,
) -> Result<()> {
    for (start, length, depth) in index.runs() {
        if length == 0 {
            continue;
        }
        if !depth.is_finite() {
            return Err(CountsError::InvalidRun(format!(
                "non-finite depth at position {}",
                start
            )));
        }
        writer.append_run(depth.round() as i64, length)?;
    }
    Ok(())
}

/// Depth command configuration.
#[derive(Debug, Clone, Default)]
pub struct DepthCommand {
    pub config: CountsConfig,
}

impl DepthCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CountsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        out_dir: Q,
    ) -> Result<Vec<DepthFile>> {
        let records = read_records(input)?;
        self.write_depth(records, out_dir.as_ref())
    }

    /// Write `<out_dir>/<chrom>.counts` for every chromosome with reads.
    pub fn write_depth(&self, records: Vec<BedRecord>, out_dir: &Path) -> Result<Vec<DepthFile>> {
        fs::create_dir_all(out_dir)?;
        let groups = group_records_by_chromosome(records);
        let files = process_chromosomes(&groups, |chrom, reads| {
            let index = build_index(chrom, reads, false)?;
            let path = out_dir.join(format!("{}.{}", chrom, COUNTS_EXTENSION));
            let mut writer = CountsWriter::create(&path, &self.config)?;
            encode_index(&index, &mut writer)?;
            writer.flush_run()?;
            let (records, bases) = (writer.records_written(), writer.bases_written());
            writer.close()?;
            Ok(DepthFile {
                chrom: chrom.to_string(),
                path,
                records,
                bases,
            })
        })?;
        for (_, file) in &files {
            log::info!("wrote {}", file);
        }
        Ok(files.into_iter().map(|(_, file)| file).collect())
    }
}
