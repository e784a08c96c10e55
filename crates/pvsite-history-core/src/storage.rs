//! Where observation files live and how their bytes are read.
//!
//! Data sources resolve a `StorageLocation` and ask this module for the bytes
//! behind it. Only local files are supported; the location is still recorded
//! as an enum so snapshots name the backend explicitly.

use std::{
    error::Error,
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::{Backtrace, prelude::*};

/// Result of reading from a `StorageLocation`.
pub type StorageResult<T> = Result<T, StorageError>;

/// Location of a backing observation file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    /// A Parquet file on the local filesystem.
    Local(PathBuf),
}

impl StorageLocation {
    /// Location of a local observation file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        StorageLocation::Local(path.into())
    }

    /// Parse a location given on the command line or in a config file.
    ///
    /// A leading `file://` is stripped. Blank input is rejected.
    pub fn parse(spec: &str) -> StorageResult<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return InvalidLocationSnafu {
                spec: spec.to_string(),
            }
            .fail();
        }

        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        Ok(StorageLocation::local(path))
    }

    /// Human-readable form used in error messages and logs.
    pub fn display(&self) -> String {
        match self {
            StorageLocation::Local(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// The raw failure reported by the backend behind a location.
#[derive(Debug)]
pub enum BackendError {
    /// `std::fs` failed on a local file.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local file error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Failures while resolving or reading an observation file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// No observation file exists at the location.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// Location as shown to the user.
        path: String,
        /// Backend report.
        source: BackendError,
        /// Captured where the read failed.
        backtrace: Backtrace,
    },

    /// The file exists but could not be read, e.g. it is a directory or
    /// permission was denied.
    #[snafu(display("Cannot read observation file {path}: {source}"))]
    OtherIo {
        /// Location as shown to the user.
        path: String,
        /// Backend report.
        source: BackendError,
        /// Captured where the read failed.
        backtrace: Backtrace,
    },

    /// A location string was blank.
    #[snafu(display("Invalid storage location: {spec:?}"))]
    InvalidLocation {
        /// The input as given.
        spec: String,
    },
}

fn local_path(location: &StorageLocation) -> &Path {
    match location {
        StorageLocation::Local(path) => path,
    }
}

/// Read the whole object at `location` into memory.
///
/// # Errors
///
/// `StorageError::NotFound` if nothing exists at the location and
/// `StorageError::OtherIo` for every other failure.
pub fn read_all_bytes(location: &StorageLocation) -> StorageResult<Vec<u8>> {
    let path = local_path(location);

    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu {
                path: path.display().to_string(),
            })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: path.display().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestResult;
    use tempfile::TempDir;

    #[test]
    fn read_all_bytes_returns_file_contents() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("obs.parquet");
        std::fs::write(&path, b"PAR1")?;

        let bytes = read_all_bytes(&StorageLocation::local(&path))?;
        assert_eq!(bytes, b"PAR1");
        Ok(())
    }

    #[test]
    fn read_all_bytes_reports_missing_file_as_not_found() -> TestResult {
        let tmp = TempDir::new()?;
        let location = StorageLocation::local(tmp.path().join("missing.parquet"));

        let err = read_all_bytes(&location).expect_err("missing file should error");
        assert!(matches!(err, StorageError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn read_all_bytes_on_directory_is_other_io() -> TestResult {
        let tmp = TempDir::new()?;

        let err = read_all_bytes(&StorageLocation::local(tmp.path()))
            .expect_err("directory should not be readable as a file");
        assert!(matches!(err, StorageError::OtherIo { .. }));
        Ok(())
    }

    #[test]
    fn parse_strips_file_scheme_and_rejects_blank() {
        assert_eq!(
            StorageLocation::parse("file:///data/pv.parquet").unwrap(),
            StorageLocation::local("/data/pv.parquet")
        );
        assert!(matches!(
            StorageLocation::parse("   "),
            Err(StorageError::InvalidLocation { .. })
        ));
    }
}
