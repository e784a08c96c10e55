//! Snapshot/restore for `ParquetPvDataSource`.
//!
//! A snapshot is the configuration needed to reopen the backing file plus
//! the instance cutoff. It never holds the decoded table: restoring always
//! reruns the open path against the recorded location, so the restored source
//! behaves exactly like the original as long as the file is unchanged.
//!
//! ```text
//! Open --snapshot()--> DataSourceSnapshot --restore()--> Open
//! ```

use std::{path::Path, sync::Arc};

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    config::SourceConfig,
    parquet_source::{ParquetPvDataSource, open::open_store},
    source::error::{ConfigFileSnafu, SourceError, SourceResult, StorageSnafu},
    storage::{self, StorageLocation},
    timestamp::Timestamp,
};

/// Everything a `ParquetPvDataSource` needs to be rebuilt, minus the handle.
///
/// Serializes as one flat mapping: the `SourceConfig` fields plus `max_ts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceSnapshot {
    /// How to reopen the backing file.
    #[serde(flatten)]
    pub config: SourceConfig,
    /// The cutoff at snapshot time.
    #[serde(default)]
    pub max_ts: Option<Timestamp>,
}

impl DataSourceSnapshot {
    /// Load a snapshot previously written as JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let location = StorageLocation::local(path.as_ref());
        let bytes = storage::read_all_bytes(&location).context(StorageSnafu)?;
        serde_json::from_slice(&bytes).context(ConfigFileSnafu {
            path: location.display(),
        })
    }
}

impl ParquetPvDataSource {
    /// Capture configuration and cutoff. The receiver is unchanged.
    pub fn snapshot(&self) -> DataSourceSnapshot {
        DataSourceSnapshot {
            config: self.config.clone(),
            max_ts: self.max_ts,
        }
    }

    /// Reopen the backing file recorded in `snapshot` and reapply its cutoff.
    ///
    /// # Errors
    ///
    /// The same errors as [`ParquetPvDataSource::open`].
    pub fn restore(snapshot: DataSourceSnapshot) -> SourceResult<Self> {
        let DataSourceSnapshot { config, max_ts } = snapshot;
        let store = open_store(&config)?;

        debug!(
            "restored PV data source {} with cutoff {max_ts:?}",
            config.location
        );

        Ok(Self {
            config,
            store: Arc::new(store),
            max_ts,
        })
    }
}

impl From<ParquetPvDataSource> for DataSourceSnapshot {
    fn from(source: ParquetPvDataSource) -> Self {
        DataSourceSnapshot {
            config: source.config,
            max_ts: source.max_ts,
        }
    }
}

impl TryFrom<DataSourceSnapshot> for ParquetPvDataSource {
    type Error = SourceError;

    fn try_from(snapshot: DataSourceSnapshot) -> SourceResult<Self> {
        ParquetPvDataSource::restore(snapshot)
    }
}
