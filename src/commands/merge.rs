//! Merge command implementation.
//!
//! Sums several counts streams, each optionally shifted along the axis, and
//! prints the result as bedGraph.

use crate::codec::CountsReader;
use crate::commands::decode::{chrom_label, write_bedgraph, RunStats};
use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use crate::merge::StreamMerger;
use crate::offset::OffsetView;
use crate::transition::TransitionStream;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Open each input, wrapped in an offset view. Inputs without an offset are
/// not shifted.
pub fn open_streams(
    inputs: &[PathBuf],
    offsets: &[i64],
    config: &CountsConfig,
) -> Result<Vec<OffsetView<CountsReader>>> {
    if offsets.len() > inputs.len() {
        return Err(CountsError::InvalidFormat(format!(
            "{} offsets given for {} inputs",
            offsets.len(),
            inputs.len()
        )));
    }
    inputs
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let reader = CountsReader::open_with_config(path, config)?;
            Ok(OffsetView::new(reader, offsets.get(i).copied().unwrap_or(0)))
        })
        .collect()
}

/// Merge command configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeCommand {
    /// Shift applied to each input, by input order.
    pub offsets: Vec<i64>,
    /// Chromosome column; defaults to the first input's file stem.
    pub chrom: Option<String>,
    /// Also print zero-count runs.
    pub report_zero: bool,
    pub config: CountsConfig,
}

impl MergeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offsets(mut self, offsets: Vec<i64>) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn with_chrom(mut self, chrom: Option<String>) -> Self {
        self.chrom = chrom;
        self
    }

    pub fn with_report_zero(mut self, report_zero: bool) -> Self {
        self.report_zero = report_zero;
        self
    }

    pub fn run<W: Write>(&self, inputs: &[PathBuf], output: &mut W) -> Result<RunStats> {
        let Some(first) = inputs.first() else {
            return Err(CountsError::InvalidFormat(
                "merge needs at least one input".to_string(),
            ));
        };
        let streams = open_streams(inputs, &self.offsets, &self.config)?;
        let mut merger = StreamMerger::with_config(streams, &self.config);

        let chrom = chrom_label(Path::new(first), self.chrom.as_deref());
        let stats = write_bedgraph(&chrom, &mut merger, self.report_zero, output)?;
        merger.close()?;
        log::info!("merged {} streams: {}", inputs.len(), stats);
        Ok(stats)
    }
}
