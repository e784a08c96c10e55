//! Open-time configuration for file-backed data sources.
//!
//! A `SourceConfig` holds everything needed to (re)open a backing file: where
//! it lives, which physical columns mean "PV id" and "timestamp", and any
//! further column renames. It is the part of a data source that survives a
//! snapshot, so it is plain serde data with no live handles.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{
    source::error::{ConfigFileSnafu, SourceResult, StorageSnafu},
    storage::{self, StorageLocation},
};

/// Canonical name of the PV id column after open.
pub const PV_ID_COLUMN: &str = "pv_id";

/// Canonical name of the timestamp column after open.
pub const TS_COLUMN: &str = "ts";

fn default_timestamp_dim_name() -> String {
    TS_COLUMN.to_string()
}

fn default_id_dim_name() -> String {
    PV_ID_COLUMN.to_string()
}

/// How to open a backing observation file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Where the backing file lives.
    pub location: StorageLocation,
    /// Physical name of the timestamp column.
    #[serde(default = "default_timestamp_dim_name")]
    pub timestamp_dim_name: String,
    /// Physical name of the PV id column.
    #[serde(default = "default_id_dim_name")]
    pub id_dim_name: String,
    /// Extra column renames, `physical -> logical`. Entries here win over the
    /// renames implied by the dimension names.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Configuration for a file whose columns already use the canonical names.
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            timestamp_dim_name: default_timestamp_dim_name(),
            id_dim_name: default_id_dim_name(),
            rename: BTreeMap::new(),
        }
    }

    /// Shorthand for a local file.
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self::new(StorageLocation::local(path.as_ref()))
    }

    /// Use `name` as the physical timestamp column.
    pub fn with_timestamp_dim_name(mut self, name: impl Into<String>) -> Self {
        self.timestamp_dim_name = name.into();
        self
    }

    /// Use `name` as the physical PV id column.
    pub fn with_id_dim_name(mut self, name: impl Into<String>) -> Self {
        self.id_dim_name = name.into();
        self
    }

    /// Add a column rename applied at open.
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename.insert(from.into(), to.into());
        self
    }

    /// The full rename map applied at open.
    ///
    /// Dimension renames are only included when they change something; user
    /// entries are always included and override dimension renames on the same
    /// source column.
    pub fn rename_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        if self.id_dim_name != PV_ID_COLUMN {
            map.insert(self.id_dim_name.clone(), PV_ID_COLUMN.to_string());
        }
        if self.timestamp_dim_name != TS_COLUMN {
            map.insert(self.timestamp_dim_name.clone(), TS_COLUMN.to_string());
        }

        map.extend(
            self.rename
                .iter()
                .map(|(from, to)| (from.clone(), to.clone())),
        );
        map
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let location = StorageLocation::local(path.as_ref());
        let bytes = storage::read_all_bytes(&location).context(StorageSnafu)?;
        serde_json::from_slice(&bytes).context(ConfigFileSnafu {
            path: location.display(),
        })
    }
}
