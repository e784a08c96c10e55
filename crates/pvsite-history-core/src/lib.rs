//! Point-in-time-correct access to historical PV site time series.
//!
//! Forecasting models train and run on historical observations, and must
//! never see data from after the moment they are pretending to be at. This
//! crate provides the pieces that enforce that:
//!
//! - A `PvDataSource` trait describing what every backend offers: listing
//!   PV ids, fetching a time window, reporting visible bounds, and deriving a
//!   copy that cannot see the future (`source` module).
//! - A total order over optional cutoffs where `None` means unbounded
//!   (`timestamp` module).
//! - A Parquet-backed implementation that opens a long-format observation
//!   file once and shares the decoded table between derived copies
//!   (`parquet_source` module).
//! - A snapshot/restore adapter so a source can be serialized, shipped to
//!   another process or cache, and reopened from its recorded configuration.
//!
//! Model training, weather sources and experiment orchestration are expected
//! to consume this crate through `PvDataSource` rather than reading the
//! backing files directly.
#![deny(missing_docs)]
pub mod config;
pub mod observations;
pub mod parquet_source;
pub mod source;
pub mod storage;
pub mod timestamp;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::SourceConfig;
pub use observations::Observations;
pub use parquet_source::{DataSourceSnapshot, ParquetPvDataSource};
pub use source::{
    PvDataSource, PvId, PvSelection,
    error::{ErrorKind, SourceError, SourceResult},
};
pub use timestamp::{Timestamp, blackout_cutoff, combine_min};
