//! Command implementations for the countrun CLI.

pub mod decode;
pub mod depth;
pub mod expression;
pub mod merge;
pub mod peaks;

pub use decode::{DecodeCommand, RunStats};
pub use depth::{DepthCommand, DepthFile};
pub use expression::{ExpressionCommand, ExpressionStats};
pub use merge::MergeCommand;
pub use peaks::{PeakStats, PeaksCommand};
