//! Encoder side of the run-length count codec.

use crate::codec::varint::{encode_signed_varint, encode_varint};
use crate::codec::{FORMAT_VERSION, MAGIC};
use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Run waiting to be written; extended while appends repeat its count.
#[derive(Debug, Clone, Copy)]
struct PendingRun {
    count: i64,
    length: u64,
}

/// Writes `(count, length)` runs as a compact delta-encoded byte stream.
///
/// Consecutive appends of the same count are folded into one run. The stream
/// is only complete after [`CountsWriter::close`], which writes the end marker.
pub struct CountsWriter<W: Write> {
    output: W,
    last_count: i64,
    pending: Option<PendingRun>,
    records_written: u64,
    bases_written: u64,
}

impl CountsWriter<BufWriter<File>> {
    /// Create a counts file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, config: &CountsConfig) -> Result<Self> {
        let file = File::create(path)?;
        Self::with_config(BufWriter::new(file), config)
    }
}

impl<W: Write> CountsWriter<W> {
    /// Start a stream with a baseline count of zero.
    pub fn new(output: W) -> Result<Self> {
        Self::with_config(output, &CountsConfig::default())
    }

    /// Start a stream whose first delta is taken against `config.initial_count`.
    pub fn with_config(mut output: W, config: &CountsConfig) -> Result<Self> {
        output.write_all(MAGIC)?;
        output.write_all(&[FORMAT_VERSION])?;
        encode_signed_varint(|b| output.write_all(b), config.initial_count)?;
        Ok(Self {
            output,
            last_count: config.initial_count,
            pending: None,
            records_written: 0,
            bases_written: 0,
        })
    }

    /// Append `length` positions with value `count`.
    pub fn append_run(&mut self, count: i64, length: u32) -> Result<()> {
        if length == 0 {
            return Err(CountsError::InvalidRun(format!(
                "zero-length run for count {}",
                count
            )));
        }
        self.bases_written += length as u64;
        match self.pending.as_mut() {
            Some(run) if run.count == count => {
                run.length += length as u64;
                Ok(())
            }
            _ => {
                self.flush_run()?;
                self.pending = Some(PendingRun {
                    count,
                    length: length as u64,
                });
                Ok(())
            }
        }
    }

    /// Write out the in-flight run now. A later append of the same count
    /// starts a new record with a zero delta; readers fold it back.
    pub fn flush_run(&mut self) -> Result<()> {
        if let Some(run) = self.pending.take() {
            let delta = run.count.checked_sub(self.last_count).ok_or_else(|| {
                CountsError::InvalidRun(format!("delta from {} overflows", self.last_count))
            })?;
            let mut remaining = run.length;
            let mut delta = delta;
            while remaining > 0 {
                let chunk = remaining.min(u32::MAX as u64);
                encode_varint(|b| self.output.write_all(b), chunk)?;
                encode_signed_varint(|b| self.output.write_all(b), delta)?;
                self.records_written += 1;
                remaining -= chunk;
                delta = 0;
            }
            self.last_count = run.count;
        }
        Ok(())
    }

    /// Number of positions appended so far.
    pub fn bases_written(&self) -> u64 {
        self.bases_written
    }

    /// Number of run records emitted so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Finish the stream and return the underlying writer.
    pub fn close(mut self) -> Result<W> {
        self.flush_run()?;
        encode_varint(|b| self.output.write_all(b), 0)?;
        self.output.flush()?;
        log::debug!(
            "closed counts stream: {} records over {} bases",
            self.records_written,
            self.bases_written
        );
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_end_marker() {
        let writer = CountsWriter::new(Vec::new()).unwrap();
        let bytes = writer.close().unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes[4], FORMAT_VERSION);
        // baseline 0, then end marker
        assert_eq!(&bytes[5..], &[0, 0]);
    }

    #[test]
    fn test_equal_counts_are_folded() {
        let mut writer = CountsWriter::new(Vec::new()).unwrap();
        writer.append_run(3, 2).unwrap();
        writer.append_run(3, 5).unwrap();
        writer.append_run(4, 1).unwrap();
        assert_eq!(writer.bases_written(), 8);
        writer.flush_run().unwrap();
        assert_eq!(writer.records_written(), 2);
    }

    #[test]
    fn test_flush_run_emits_zero_delta_record() {
        let mut writer = CountsWriter::new(Vec::new()).unwrap();
        writer.append_run(3, 2).unwrap();
        writer.flush_run().unwrap();
        writer.append_run(3, 2).unwrap();
        let bytes = writer.close().unwrap();
        // header(5) + baseline(1) + [2, zz(3)=6] + [2, 0] + end
        assert_eq!(&bytes[6..], &[2, 6, 2, 0, 0]);
    }

    #[test]
    fn test_zero_length_run_rejected() {
        let mut writer = CountsWriter::new(Vec::new()).unwrap();
        assert!(matches!(
            writer.append_run(1, 0),
            Err(CountsError::InvalidRun(_))
        ));
    }
}
