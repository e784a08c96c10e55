//! Parquet-backed PV data source.
//!
//! `ParquetPvDataSource` opens a long-format Parquet file (one row per PV id
//! and timestamp) once, keeps the decoded table behind an `Arc`, and layers an
//! instance-local cutoff on top. Deriving a leakage-safe copy with
//! [`PvDataSource::without_future`] clones the configuration and the `Arc`
//! only; the observations are never copied and the parent is never modified.
//!
//! Instances can be turned into a [`DataSourceSnapshot`] (configuration plus
//! cutoff, no handle) and restored from one, which reopens the file. The serde
//! impls go through the same snapshot, so a source can be serialized with any
//! serde format and shipped to another process.

mod open;
mod select;
mod snapshot;


use std::{collections::HashSet, path::Path, sync::Arc};

use log::debug;
use serde::{Deserialize, Serialize};

pub use self::snapshot::DataSourceSnapshot;
use self::open::{ObservationStore, open_store};
use crate::{
    config::SourceConfig,
    observations::Observations,
    source::{
        PvDataSource, PvId, PvSelection,
        error::{SourceError, SourceResult},
    },
    timestamp::{Timestamp, blackout_cutoff, combine_min},
};

/// A read-only PV data source over a single Parquet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "DataSourceSnapshot", try_from = "DataSourceSnapshot")]
pub struct ParquetPvDataSource {
    config: SourceConfig,
    store: Arc<ObservationStore>,
    max_ts: Option<Timestamp>,
}

impl ParquetPvDataSource {
    /// Open the file described by `config`. The cutoff starts unbounded.
    ///
    /// # Errors
    ///
    /// Storage errors if the file is missing, unreadable or not Parquet, and
    /// configuration errors if the dimension names or renames do not fit the
    /// file.
    pub fn open(config: SourceConfig) -> SourceResult<Self> {
        let store = open_store(&config)?;
        Ok(Self {
            config,
            store: Arc::new(store),
            max_ts: None,
        })
    }

    /// Open a file whose columns are already named `pv_id` and `ts`.
    pub fn open_path(path: impl AsRef<Path>) -> SourceResult<Self> {
        Self::open(SourceConfig::local(path))
    }

    /// The configuration this source was opened with.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Whether `self` and `other` read from the same open handle.
    pub fn shares_store_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// A sibling sharing this source's handle, with the given cutoff.
    fn with_cutoff(&self, max_ts: Option<Timestamp>) -> Self {
        Self {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            max_ts,
        }
    }
}

impl PvDataSource for ParquetPvDataSource {
    fn get(
        &self,
        pv_ids: &PvSelection,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SourceResult<Observations> {
        let ids = pv_ids.ids();
        if ids.is_empty() {
            return Err(SourceError::EmptySelection);
        }

        let mut reported = HashSet::new();
        let missing: Vec<PvId> = ids
            .iter()
            .filter(|id| !self.store.pv_id_set.contains(id.as_str()))
            .filter(|id| reported.insert(*id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::NotFound { pv_ids: missing });
        }

        let end = combine_min(self.max_ts, end);
        let batch = self.store.select(ids, start, end)?;
        Ok(Observations::new(batch))
    }

    fn list_pv_ids(&self) -> Vec<PvId> {
        self.store.pv_ids.clone()
    }

    fn min_ts(&self) -> Timestamp {
        // combine_min with a concrete left side is always concrete
        combine_min(Some(self.store.ts_min), self.max_ts).unwrap_or(self.store.ts_min)
    }

    fn max_ts(&self) -> Timestamp {
        combine_min(Some(self.store.ts_max), self.max_ts).unwrap_or(self.store.ts_max)
    }

    fn cutoff(&self) -> Option<Timestamp> {
        self.max_ts
    }

    fn without_future(&self, now: Timestamp, blackout_minutes: u32) -> Self {
        let cutoff = combine_min(self.max_ts, Some(blackout_cutoff(now, blackout_minutes)));
        debug!(
            "derived PV data source {}: now={now}, blackout={blackout_minutes}min, cutoff={cutoff:?}",
            self.config.location
        );
        self.with_cutoff(cutoff)
    }
}
