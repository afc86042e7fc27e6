//! Peaks command implementation.

use crate::codec::CountsReader;
use crate::commands::decode::chrom_label;
use crate::commands::merge::open_streams;
use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use crate::merge::StreamMerger;
use crate::output::TsvWriter;
use crate::peaks::PeakSegmenter;
use crate::transition::TransitionStream;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeakStats {
    pub peaks: usize,
    pub bases: u64,
}

impl fmt::Display for PeakStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peaks={} bases={}", self.peaks, self.bases)
    }
}

/// Peaks command configuration.
#[derive(Debug, Clone, Default)]
pub struct PeaksCommand {
    pub chrom: Option<String>,
    pub config: CountsConfig,
}

impl PeaksCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report runs whose count is strictly above `threshold`.
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.config = self.config.with_peak_threshold(threshold);
        self
    }

    pub fn with_chrom(mut self, chrom: Option<String>) -> Self {
        self.chrom = chrom;
        self
    }

    /// Detect peaks in one stream, or in the sum of several.
    pub fn run<W: Write>(&self, inputs: &[PathBuf], output: &mut W) -> Result<PeakStats> {
        let stream: Box<dyn TransitionStream> = match inputs {
            [] => {
                return Err(CountsError::InvalidFormat(
                    "peaks needs at least one input".to_string(),
                ))
            }
            [single] => Box::new(CountsReader::open_with_config(single, &self.config)?),
            _ => Box::new(StreamMerger::with_config(
                open_streams(inputs, &[], &self.config)?,
                &self.config,
            )),
        };
        let chrom = chrom_label(Path::new(&inputs[0]), self.chrom.as_deref());
        self.write_peaks(&chrom, stream, output)
    }

    pub fn write_peaks<S: TransitionStream, W: Write>(
        &self,
        chrom: &str,
        stream: S,
        output: &mut W,
    ) -> Result<PeakStats> {
        let mut segmenter = PeakSegmenter::with_config(stream, &self.config);
        let mut writer = TsvWriter::new(output);
        let mut stats = PeakStats::default();
        while segmenter.has_next()? {
            let peak = segmenter.next_peak()?;
            writer.write_peak(chrom.as_bytes(), &peak)?;
            stats.peaks += 1;
            stats.bases += peak.length;
        }
        writer.flush()?;
        segmenter.close()?;
        log::info!(
            "{}: {} (threshold {})",
            chrom,
            stats,
            segmenter.threshold()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CountsWriter;

    fn stream(runs: &[(i64, u32)]) -> CountsReader {
        let mut writer = CountsWriter::new(Vec::new()).unwrap();
        for &(count, length) in runs {
            writer.append_run(count, length).unwrap();
        }
        CountsReader::from_bytes(writer.close().unwrap()).unwrap()
    }

    #[test]
    fn test_write_peaks() {
        let mut output = Vec::new();
        let stats = PeaksCommand::new()
            .with_threshold(1)
            .write_peaks(
                "chr2",
                stream(&[(0, 5), (3, 4), (5, 2), (1, 10), (2, 1)]),
                &mut output,
            )
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "chr2\t5\t11\t6\t8\nchr2\t21\t22\t1\t2\n"
        );
        assert_eq!(stats, PeakStats { peaks: 2, bases: 7 });
    }

    #[test]
    fn test_no_inputs() {
        assert!(PeaksCommand::new().run(&[], &mut Vec::new()).is_err());
    }
}
