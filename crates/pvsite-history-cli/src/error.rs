use std::path::PathBuf;

use arrow::error::ArrowError;
use pvsite_history_core::{SourceError, storage::StorageError};
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Either --file or --snapshot is required"))]
    MissingSource,

    #[snafu(display("Invalid --file value"))]
    InvalidLocation { source: StorageError },

    #[snafu(display(
        "Failed to open PV data file {path}. \
         Check that it is Parquet with the expected id and timestamp columns."
    ))]
    OpenSource {
        path: String,
        #[snafu(source(from(SourceError, Box::new)))]
        source: Box<SourceError>,
    },

    #[snafu(display("Failed to restore data source from snapshot {path}"))]
    RestoreSnapshot {
        path: String,
        #[snafu(source(from(SourceError, Box::new)))]
        source: Box<SourceError>,
    },

    #[snafu(display("Query failed"))]
    Query {
        #[snafu(source(from(SourceError, Box::new)))]
        source: Box<SourceError>,
    },

    #[snafu(display(
        "Invalid timestamp '{value}'. \
         Use RFC 3339, YYYY-MM-DDTHH:MM[:SS] (UTC) or YYYY-MM-DD."
    ))]
    InvalidTimestamp { value: String },

    #[snafu(display("Invalid --rename '{spec}': expected FROM=TO"))]
    InvalidRename { spec: String },

    #[snafu(display("Failed to serialize snapshot: {source}"))]
    SerializeSnapshot { source: serde_json::Error },

    #[snafu(display("Failed to format observations: {source}"))]
    Arrow { source: ArrowError },

    #[snafu(display("Failed to write output to {}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write to stdout: {source}"))]
    Stdout { source: std::io::Error },
}
