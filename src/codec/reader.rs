//! Decoder side of the run-length count codec.

use crate::codec::varint::{decode_signed_varint, decode_varint};
use crate::codec::{FORMAT_VERSION, MAGIC};
use crate::config::CountsConfig;
use crate::error::{CountsError, Result};
use crate::transition::{Transition, TransitionStream};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Bytes behind a reader.
enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
    Closed,
}

impl Backing {
    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Owned(bytes) => bytes.as_slice(),
            Backing::Mapped(mmap) => &mmap[..],
            Backing::Closed => &[],
        }
    }
}

/// Decoder state at the start of a transition, used by `reposition`.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    position: u64,
    offset: usize,
    running_count: i64,
}

/// One raw record as stored in the stream.
#[derive(Debug, Clone, Copy)]
struct Record {
    length: u32,
    delta: i64,
    next_offset: usize,
}

/// Reads the transitions of an encoded count stream.
///
/// Zero-delta records written back to back are folded into a single run, so
/// consecutive transitions always differ in count (unless a run would exceed
/// `u32::MAX` positions).
///
/// Random access is provided by a sparse checkpoint index filled in while
/// decoding: [`TransitionStream::reposition`] jumps to the closest checkpoint
/// at or before the target and decodes forward from there.
pub struct CountsReader {
    data: Backing,
    initial_count: i64,
    /// Byte offset of the next undecoded record.
    offset: usize,
    /// Position at which the next undecoded record starts.
    next_position: u64,
    /// Count of the last decoded run, or the baseline.
    running_count: i64,
    current: Transition,
    pending: Option<Transition>,
    finished: bool,
    checkpoints: Vec<Checkpoint>,
    checkpoint_interval: usize,
    since_checkpoint: usize,
}

impl CountsReader {
    /// Memory-map a persisted counts file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, &CountsConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &CountsConfig) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_backing(Backing::Mapped(mmap), config)
    }

    /// Read a stream held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::with_config(bytes, &CountsConfig::default())
    }

    pub fn with_config(bytes: Vec<u8>, config: &CountsConfig) -> Result<Self> {
        Self::from_backing(Backing::Owned(bytes), config)
    }

    fn from_backing(data: Backing, config: &CountsConfig) -> Result<Self> {
        let (initial_count, data_start) = parse_header(data.bytes())?;
        let start = Checkpoint {
            position: 0,
            offset: data_start,
            running_count: initial_count,
        };
        Ok(Self {
            data,
            initial_count,
            offset: data_start,
            next_position: 0,
            running_count: initial_count,
            current: Transition::default(),
            pending: None,
            finished: false,
            checkpoints: vec![start],
            checkpoint_interval: config.checkpoint_interval.max(1),
            since_checkpoint: 0,
        })
    }

    /// Baseline the writer used for the first delta.
    pub fn initial_count(&self) -> i64 {
        self.initial_count
    }

    /// Size of the encoded stream in bytes (zero once closed).
    pub fn encoded_len(&self) -> usize {
        self.data.bytes().len()
    }

    fn decode_record(&self, offset: usize) -> Result<Option<Record>> {
        let data = self.data.bytes();
        if offset >= data.len() {
            return Err(CountsError::malformed(offset, "missing end marker"));
        }
        let mut cursor = offset;
        let length = decode_varint(data, &mut cursor)?;
        if length == 0 {
            if cursor != data.len() {
                return Err(CountsError::malformed(
                    cursor,
                    "trailing bytes after end marker",
                ));
            }
            return Ok(None);
        }
        let length = u32::try_from(length).map_err(|_| {
            CountsError::malformed(offset, format!("run length {} exceeds u32", length))
        })?;
        let delta = decode_signed_varint(data, &mut cursor)?;
        Ok(Some(Record {
            length,
            delta,
            next_offset: cursor,
        }))
    }

    fn maybe_checkpoint(&mut self) {
        let beyond_index = self
            .checkpoints
            .last()
            .is_none_or(|c| c.position < self.next_position);
        if beyond_index && self.since_checkpoint >= self.checkpoint_interval {
            self.checkpoints.push(Checkpoint {
                position: self.next_position,
                offset: self.offset,
                running_count: self.running_count,
            });
            self.since_checkpoint = 0;
        }
    }

    /// Decode the next run, folding zero-delta continuation records into it.
    fn decode_transition(&mut self) -> Result<Option<Transition>> {
        if self.finished {
            return Ok(None);
        }
        self.maybe_checkpoint();

        let Some(record) = self.decode_record(self.offset)? else {
            self.finished = true;
            return Ok(None);
        };
        let count = self
            .running_count
            .checked_add(record.delta)
            .ok_or_else(|| CountsError::malformed(self.offset, "count overflows i64"))?;

        let mut length = record.length;
        let mut offset = record.next_offset;
        while let Some(next) = self.decode_record(offset)? {
            if next.delta != 0 {
                break;
            }
            match length.checked_add(next.length) {
                Some(sum) => {
                    length = sum;
                    offset = next.next_offset;
                }
                None => break,
            }
        }

        let transition = Transition::new(self.next_position, length, count, record.delta);
        self.offset = offset;
        self.next_position = transition.end();
        self.running_count = count;
        self.since_checkpoint += 1;
        Ok(Some(transition))
    }
}

fn parse_header(data: &[u8]) -> Result<(i64, usize)> {
    if data.len() < MAGIC.len() + 1 || &data[..MAGIC.len()] != MAGIC {
        return Err(CountsError::malformed(0, "not a counts stream (bad magic)"));
    }
    let version = data[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(CountsError::malformed(
            MAGIC.len(),
            format!("unsupported format version {}", version),
        ));
    }
    let mut offset = MAGIC.len() + 1;
    let initial_count = decode_signed_varint(data, &mut offset)?;
    Ok((initial_count, offset))
}

impl TransitionStream for CountsReader {
    fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.decode_transition()?;
        }
        Ok(self.pending.is_some())
    }

    fn next_transition(&mut self) -> Result<Transition> {
        self.has_next()?;
        let transition = self.pending.take().ok_or(CountsError::NoMoreTransitions)?;
        self.current = transition;
        Ok(transition)
    }

    fn current(&self) -> Transition {
        self.current
    }

    fn reposition(&mut self, position: u64) -> Result<()> {
        if matches!(self.data, Backing::Closed) {
            return Err(CountsError::UnsupportedOperation("reader is closed"));
        }
        let index = self.checkpoints.partition_point(|c| c.position <= position);
        let checkpoint = self.checkpoints[index.saturating_sub(1)];
        self.offset = checkpoint.offset;
        self.next_position = checkpoint.position;
        self.running_count = checkpoint.running_count;
        self.finished = false;
        self.pending = None;
        self.since_checkpoint = 0;

        while let Some(transition) = self.decode_transition()? {
            if transition.end() > position {
                self.pending = Some(transition);
                break;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.data = Backing::Closed;
        self.pending = None;
        self.finished = true;
        self.checkpoints.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CountsWriter;

    fn encode(runs: &[(i64, u32)], config: &CountsConfig) -> Vec<u8> {
        let mut writer = CountsWriter::with_config(Vec::new(), config).unwrap();
        for &(count, length) in runs {
            writer.append_run(count, length).unwrap();
        }
        writer.close().unwrap()
    }

    fn decode_all(reader: &mut CountsReader) -> Vec<Transition> {
        reader.transitions().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_read_transitions_with_baseline() {
        let config = CountsConfig::new().with_initial_count(45);
        let bytes = encode(&[(10, 1), (15, 1)], &config);
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        assert_eq!(reader.initial_count(), 45);

        assert!(reader.has_next().unwrap());
        reader.next_transition().unwrap();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.length(), 1);
        assert_eq!(reader.count(), 10);
        assert_eq!(reader.delta_count(), -35);

        assert!(reader.has_next().unwrap());
        reader.next_transition().unwrap();
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.length(), 1);
        assert_eq!(reader.count(), 15);
        assert_eq!(reader.delta_count(), 5);
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_round_trip_long_runs() {
        let bytes = encode(
            &[(10, 5), (11, 100_000), (12, 10), (10, 1)],
            &CountsConfig::default(),
        );
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        let got: Vec<(u64, u32, i64)> = decode_all(&mut reader)
            .iter()
            .map(|t| (t.position, t.length, t.count))
            .collect();
        assert_eq!(
            got,
            vec![(0, 5, 10), (5, 100_000, 11), (100_005, 10, 12), (100_015, 1, 10)]
        );
    }

    #[test]
    fn test_next_past_end_fails() {
        let bytes = encode(&[(1, 1)], &CountsConfig::default());
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        reader.next_transition().unwrap();
        assert!(matches!(
            reader.next_transition(),
            Err(CountsError::NoMoreTransitions)
        ));
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let bytes = encode(&[(1, 3), (2, 4)], &CountsConfig::default());
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        for _ in 0..5 {
            assert!(reader.has_next().unwrap());
        }
        assert_eq!(reader.next_transition().unwrap().count, 1);
        assert_eq!(reader.next_transition().unwrap().count, 2);
    }

    #[test]
    fn test_zero_delta_records_are_folded() {
        let mut writer = CountsWriter::new(Vec::new()).unwrap();
        writer.append_run(7, 3).unwrap();
        writer.flush_run().unwrap();
        writer.append_run(7, 4).unwrap();
        writer.flush_run().unwrap();
        writer.append_run(2, 1).unwrap();
        let bytes = writer.close().unwrap();

        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        let got = decode_all(&mut reader);
        assert_eq!(
            got,
            vec![Transition::new(0, 7, 7, 7), Transition::new(7, 1, 2, -5)]
        );
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let mut bytes = encode(&[(1, 300), (2, 300)], &CountsConfig::default());
        bytes.truncate(bytes.len() - 2);
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        let result: Result<Vec<_>> = reader.transitions().collect();
        assert!(matches!(
            result,
            Err(CountsError::MalformedEncoding { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let result = CountsReader::from_bytes(b"XXXX\x01\x00\x00".to_vec());
        assert!(matches!(
            result,
            Err(CountsError::MalformedEncoding { offset: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&[(1, 1)], &CountsConfig::default());
        bytes.push(3);
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        assert!(reader.next_transition().is_err());
    }

    #[test]
    fn test_reposition_backward_and_forward() {
        let runs: Vec<(i64, u32)> = (0..100).map(|i| (i % 7, 10)).collect();
        let config = CountsConfig::new().with_checkpoint_interval(8);
        let mut reader = CountsReader::with_config(encode(&runs, &config), &config).unwrap();

        reader.skip_to(900).unwrap();
        assert_eq!(reader.position(), 900);

        reader.reposition(123).unwrap();
        let t = reader.next_transition().unwrap();
        assert_eq!(t.position, 120);
        assert_eq!(t.count, 12 % 7);
        assert_eq!(t.delta_count, (12 % 7) - (11 % 7));

        reader.reposition(995).unwrap();
        let t = reader.next_transition().unwrap();
        assert_eq!(t.position, 990);
        assert!(!reader.has_next().unwrap());

        reader.reposition(5_000).unwrap();
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_close_releases_data() {
        let bytes = encode(&[(1, 1), (2, 1)], &CountsConfig::default());
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        reader.close().unwrap();
        assert_eq!(reader.encoded_len(), 0);
        assert!(!reader.has_next().unwrap());
        assert!(matches!(
            reader.reposition(0),
            Err(CountsError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_per_base_counts() {
        let bytes = encode(&[(10, 2), (15, 1)], &CountsConfig::default());
        let mut reader = CountsReader::from_bytes(bytes).unwrap();
        let bases: Vec<(u64, i64)> = reader.per_base().collect::<Result<_>>().unwrap();
        assert_eq!(bases, vec![(0, 10), (1, 10), (2, 15)]);
    }
}
