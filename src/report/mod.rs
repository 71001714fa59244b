//! Aggregation of per-tool results into the final output file

pub mod aggregate;
pub mod decode;
pub mod error;
pub mod identity;
pub mod result;

pub use aggregate::ResultAggregator;
pub use error::{DecodeError, ReportError, ReportResult};
pub use result::{MergedEntry, ScanResult};
