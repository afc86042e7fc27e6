//! Tab-separated output for runs, peaks and expression values.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::annotation::Annotation;
use crate::error::Result;
use crate::peaks::Peak;
use crate::transition::Transition;
use std::io::{BufWriter, Write};

/// Buffer size for TsvWriter (8MB default).
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Buffered tab-separated writer.
pub struct TsvWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Integral values print without a fractional part.
    #[inline]
    fn write_float(&mut self, f: f64) -> Result<()> {
        if f.fract() == 0.0 && f.abs() < 1e15 {
            return self.write_int(f as i64);
        }
        self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        Ok(())
    }

    #[inline]
    fn tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    #[inline]
    fn newline(&mut self) -> Result<()> {
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// `chrom  start  end  count`, one bedGraph line per run.
    #[inline]
    pub fn write_run(&mut self, chrom: &[u8], transition: &Transition) -> Result<()> {
        self.writer.write_all(chrom)?;
        self.tab()?;
        self.write_int(transition.position)?;
        self.tab()?;
        self.write_int(transition.end())?;
        self.tab()?;
        self.write_int(transition.count)?;
        self.newline()
    }

    /// `chrom  start  end  length  count`
    pub fn write_peak(&mut self, chrom: &[u8], peak: &Peak) -> Result<()> {
        self.writer.write_all(chrom)?;
        self.tab()?;
        self.write_int(peak.start)?;
        self.tab()?;
        self.write_int(peak.end())?;
        self.tab()?;
        self.write_int(peak.length)?;
        self.tab()?;
        self.write_int(peak.count)?;
        self.newline()
    }

    /// `id  chrom  start  end  expression  average_depth`, with the
    /// annotation span written half-open.
    pub fn write_expression(
        &mut self,
        annotation: &Annotation,
        expression: f64,
        average: f64,
    ) -> Result<()> {
        self.writer.write_all(annotation.id.as_bytes())?;
        self.tab()?;
        self.writer.write_all(annotation.chrom.as_bytes())?;
        self.tab()?;
        self.write_int(annotation.start())?;
        self.tab()?;
        self.write_int(annotation.end() as u64 + 1)?;
        self.tab()?;
        self.write_float(expression)?;
        self.tab()?;
        self.write_float(average)?;
        self.newline()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Segment;
    use crate::interval::Strand;

    fn written(f: impl FnOnce(&mut TsvWriter<&mut Vec<u8>>)) -> String {
        let mut output = Vec::new();
        {
            let mut writer = TsvWriter::new(&mut output);
            f(&mut writer);
            writer.flush().unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_write_run() {
        let out = written(|w| {
            w.write_run(b"chr1", &Transition::new(100, 50, 3, 1)).unwrap();
        });
        assert_eq!(out, "chr1\t100\t150\t3\n");
    }

    #[test]
    fn test_write_peak() {
        let peak = Peak {
            start: 5,
            length: 10,
            count: 42,
        };
        let out = written(|w| w.write_peak(b"chrX", &peak).unwrap());
        assert_eq!(out, "chrX\t5\t15\t10\t42\n");
    }

    #[test]
    fn test_write_expression() {
        let gene = Annotation::new(
            "g1",
            "chr1",
            Strand::Plus,
            vec![Segment::new(100, 199), Segment::new(300, 399)],
        );
        let out = written(|w| w.write_expression(&gene, 4.0, 0.25).unwrap());
        assert_eq!(out, "g1\tchr1\t100\t400\t4\t0.25\n");
    }
}
