//! countrun: run-length encoded coverage counts
//!
//! This library stores piecewise-constant count functions (read depth along a
//! chromosome) as compact run-length streams and operates on them without
//! expanding them per base.
//!
//! # Features
//!
//! - **Compact codec**: varint-encoded runs with count deltas
//! - **Stream combinators**: shifting, N-way merging, peak detection
//! - **Coverage index**: depth and read-count queries over sparse breakpoints
//! - **Parallel processing**: one Rayon task per chromosome
//!
//! # Example
//!
//! ```rust
//! use countrun::prelude::*;
//!
//! let mut writer = CountsWriter::new(Vec::new()).unwrap();
//! writer.append_run(0, 100).unwrap();
//! writer.append_run(7, 20).unwrap();
//! writer.append_run(0, 50).unwrap();
//! let bytes = writer.close().unwrap();
//!
//! let reader = CountsReader::from_bytes(bytes).unwrap();
//! let peaks: Vec<Peak> = PeakSegmenter::new(reader).collect::<Result<_>>().unwrap();
//! assert_eq!(peaks.len(), 1);
//! assert_eq!(peaks[0].start, 100);
//! assert_eq!(peaks[0].length, 20);
//! ```

pub mod annotation;
pub mod bed;
pub mod codec;
pub mod commands;
pub mod config;
pub mod coverage;
pub mod error;
pub mod interval;
pub mod merge;
pub mod offset;
pub mod output;
pub mod parallel;
pub mod peaks;
pub mod transition;

// Re-export commonly used types
pub use annotation::{Annotation, Segment};
pub use codec::{CountsReader, CountsWriter};
pub use config::CountsConfig;
pub use coverage::{CountingStrategy, SparseCoverageIndex};
pub use error::{CountsError, Result};
pub use merge::StreamMerger;
pub use offset::OffsetView;
pub use peaks::{Peak, PeakSegmenter};
pub use transition::{Transition, TransitionStream};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::annotation::{Annotation, Segment};
    pub use crate::bed::{parse_annotations, parse_records, read_annotations, read_records};
    pub use crate::codec::{CountsReader, CountsWriter};
    pub use crate::config::CountsConfig;
    pub use crate::coverage::{CountingStrategy, SparseCoverageIndex};
    pub use crate::error::{CountsError, Result};
    pub use crate::interval::{BedRecord, Strand};
    pub use crate::merge::StreamMerger;
    pub use crate::offset::OffsetView;
    pub use crate::peaks::{Peak, PeakSegmenter};
    pub use crate::transition::{Transition, TransitionStream};
}
