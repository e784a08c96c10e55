//! Error types and SNAFU context selectors for data sources.
//!
//! Every backend reports failures through `SourceError`. Variants fall into
//! three families, exposed through [`SourceError::kind`]: storage failures
//! while opening, lookups of unknown PV ids, and contradictory or malformed
//! configuration. None of them are retried internally.

use arrow::{datatypes::DataType, error::ArrowError};
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::storage::StorageError;

/// Result alias used throughout the crate.
pub type SourceResult<T> = Result<T, SourceError>;

/// Coarse classification of a [`SourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backing store is missing, unreadable or malformed.
    Storage,
    /// A requested PV id does not exist in the backing store.
    NotFound,
    /// Dimension names, renames or a selection are contradictory or malformed.
    Configuration,
}

/// Errors from opening or querying a data source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SourceError {
    /// Reading the backing file failed.
    #[snafu(display("Storage error while opening data source: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// The backing file is not valid Parquet.
    #[snafu(display("Parquet read error for {path}: {source}"))]
    ParquetRead {
        /// Location of the file being decoded.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// An Arrow kernel failed while decoding, casting or filtering.
    #[snafu(display("Arrow error: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// The backing file has no observations with a timestamp.
    #[snafu(display("Backing store {path} contains no observations"))]
    EmptyStore {
        /// Location of the empty file.
        path: String,
    },

    /// The id column contains nulls.
    #[snafu(display("Column {column} in {path} contains {null_count} null PV ids"))]
    NullPvId {
        /// Location of the file.
        path: String,
        /// Physical name of the id column.
        column: String,
        /// How many rows had a null id.
        null_count: usize,
    },

    /// A stored timestamp cannot be represented as a chrono timestamp.
    #[snafu(display("Timestamp value {value} in {path} is out of range"))]
    TimestampOutOfRange {
        /// Location of the file.
        path: String,
        /// Raw value in the column's time unit.
        value: i64,
    },

    /// One or more requested PV ids are unknown.
    #[snafu(display("PV ids not found: {}", pv_ids.join(", ")))]
    NotFound {
        /// Every missing id, in request order.
        pv_ids: Vec<String>,
    },

    /// A multi-id selection with no ids.
    #[snafu(display("PV id selection is empty"))]
    EmptySelection,

    /// The id and timestamp dimensions name the same column.
    #[snafu(display("id and timestamp dimensions both refer to column {column}"))]
    ConflictingDimensions {
        /// The shared column name.
        column: String,
    },

    /// A rename refers to a column the file does not have.
    #[snafu(display("Cannot rename {from} to {to}: no such column in {path}"))]
    UnknownRenameSource {
        /// Source column name.
        from: String,
        /// Target column name.
        to: String,
        /// Location of the file.
        path: String,
    },

    /// Two columns would end up with the same name after renaming.
    #[snafu(display("Renaming would produce duplicate column {column}"))]
    RenameCollision {
        /// The duplicated target name.
        column: String,
    },

    /// A canonical column is missing after renaming.
    #[snafu(display(
        "Missing {dimension} column {column} in {path} (after applying renames)"
    ))]
    MissingDimension {
        /// Which dimension is missing (`id` or `timestamp`).
        dimension: &'static str,
        /// The canonical column name that was looked up.
        column: String,
        /// Location of the file.
        path: String,
    },

    /// The id column has a type that cannot be read as a string id.
    #[snafu(display("Unsupported PV id column {column} with type {datatype:?}"))]
    UnsupportedIdType {
        /// Name of the id column.
        column: String,
        /// Arrow data type of the column.
        datatype: DataType,
    },

    /// The timestamp column is not an Arrow timestamp.
    #[snafu(display("Unsupported time column {column} with type {datatype:?}"))]
    UnsupportedTimeType {
        /// Name of the timestamp column.
        column: String,
        /// Arrow data type of the column.
        datatype: DataType,
    },

    /// A JSON configuration or snapshot file could not be parsed.
    #[snafu(display("Invalid data source configuration in {path}: {source}"))]
    ConfigFile {
        /// Location of the configuration file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl SourceError {
    /// Which family of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Storage { .. }
            | SourceError::ParquetRead { .. }
            | SourceError::Arrow { .. }
            | SourceError::EmptyStore { .. }
            | SourceError::NullPvId { .. }
            | SourceError::TimestampOutOfRange { .. } => ErrorKind::Storage,

            SourceError::NotFound { .. } => ErrorKind::NotFound,

            SourceError::EmptySelection
            | SourceError::ConflictingDimensions { .. }
            | SourceError::UnknownRenameSource { .. }
            | SourceError::RenameCollision { .. }
            | SourceError::MissingDimension { .. }
            | SourceError::UnsupportedIdType { .. }
            | SourceError::UnsupportedTimeType { .. }
            | SourceError::ConfigFile { .. } => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_missing_id() {
        let err = SourceError::NotFound {
            pv_ids: vec!["C".to_string(), "D".to_string()],
        };

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "PV ids not found: C, D");
    }

    #[test]
    fn configuration_errors_classify_as_configuration() {
        let err = SourceError::ConflictingDimensions {
            column: "ts".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(SourceError::EmptySelection.kind(), ErrorKind::Configuration);
    }
}
