//! Run-length count codec.
//!
//! A stream is a header followed by `(length, delta)` records:
//!
//! ```text
//! magic     b"RLCS"
//! version   1 byte
//! baseline  zigzag varint, count the first delta is taken against
//! records   { length: varint (1..=u32::MAX), delta: zigzag varint }*
//! end       varint 0
//! ```
//!
//! Counts are recovered by accumulating deltas onto the baseline.

pub mod reader;
pub mod varint;
pub mod writer;

pub use reader::CountsReader;
pub use writer::CountsWriter;

/// Leading bytes of every encoded stream.
pub const MAGIC: &[u8] = b"RLCS";

/// Current layout version.
pub const FORMAT_VERSION: u8 = 1;
