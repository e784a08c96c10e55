//! Opening a Parquet observation file into an in-memory store.
//!
//! The open path runs in four steps:
//! 1. Read the file bytes through the storage layer and decode every record
//!    batch into one table.
//! 2. Build the rename map from the configured dimension names plus user
//!    renames (see [`SourceConfig::rename_map`]).
//! 3. Apply it, rejecting renames of unknown columns and renames that would
//!    produce duplicate names.
//! 4. Canonicalize the PV id column to Utf8 and validate the timestamp column.
//!
//! The resulting `ObservationStore` caches the id list and the timestamp
//! extremes so that bound queries never rescan the table.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use arrow::{
    array::{Array, AsArray, Int64Array, RecordBatch, StringArray},
    compute::{cast, concat_batches, filter_record_batch, is_not_null},
    datatypes::{DataType, Field, Int64Type, Schema, TimeUnit},
};
use bytes::Bytes;
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use snafu::prelude::*;

use crate::{
    config::{PV_ID_COLUMN, SourceConfig, TS_COLUMN},
    source::{
        PvId,
        error::{
            ArrowSnafu, ConflictingDimensionsSnafu, EmptyStoreSnafu, ParquetReadSnafu,
            SourceError, SourceResult, StorageSnafu,
        },
    },
    storage,
    timestamp::{Timestamp, from_unit},
};

/// The decoded backing table plus the lookups derived from it at open.
///
/// Immutable after construction. Data sources share it through an `Arc`, so
/// deriving a leakage-safe copy never duplicates observations.
#[derive(Debug)]
pub(crate) struct ObservationStore {
    pub(crate) batch: RecordBatch,
    /// The `pv_id` column.
    pub(crate) pv_id_values: StringArray,
    /// The `ts` column reinterpreted as raw `i64` values in `ts_unit`.
    pub(crate) ts_values: Int64Array,
    pub(crate) ts_unit: TimeUnit,
    /// Distinct ids in first-appearance order, including ids whose rows all
    /// lacked a timestamp.
    pub(crate) pv_ids: Vec<PvId>,
    pub(crate) pv_id_set: HashSet<PvId>,
    pub(crate) ts_min: Timestamp,
    pub(crate) ts_max: Timestamp,
}

pub(crate) fn open_store(config: &SourceConfig) -> SourceResult<ObservationStore> {
    let path = config.location.display();

    ensure!(
        config.id_dim_name != config.timestamp_dim_name,
        ConflictingDimensionsSnafu {
            column: config.id_dim_name.clone(),
        }
    );

    let bytes = storage::read_all_bytes(&config.location).context(StorageSnafu)?;
    let batch = read_parquet(Bytes::from(bytes), &path)?;
    let batch = apply_renames(batch, &config.rename_map(), &path)?;
    let batch = canonicalize_pv_id(batch, &config.id_dim_name, &path)?;
    let (pv_ids, pv_id_set) = collect_pv_ids(&batch, &path)?;
    let (batch, ts_unit) = validate_timestamps(batch, &config.timestamp_dim_name, &path)?;

    ensure!(batch.num_rows() > 0, EmptyStoreSnafu { path: path.clone() });

    let store = build_store(batch, ts_unit, pv_ids, pv_id_set, &path)?;

    debug!(
        "opened PV data source {path}: {} rows, {} PV ids, ts range [{}, {}]",
        store.batch.num_rows(),
        store.pv_ids.len(),
        store.ts_min,
        store.ts_max
    );

    Ok(store)
}

fn read_parquet(bytes: Bytes, path: &str) -> SourceResult<RecordBatch> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context(ParquetReadSnafu { path })?;
    let schema = builder.schema().clone();
    let reader = builder.build().context(ParquetReadSnafu { path })?;

    let batches = reader.collect::<Result<Vec<_>, _>>().context(ArrowSnafu)?;

    concat_batches(&schema, &batches).context(ArrowSnafu)
}

fn apply_renames(
    batch: RecordBatch,
    rename_map: &BTreeMap<String, String>,
    path: &str,
) -> SourceResult<RecordBatch> {
    if rename_map.is_empty() {
        return Ok(batch);
    }

    let schema = batch.schema();

    for (from, to) in rename_map {
        if schema.index_of(from).is_err() {
            return Err(SourceError::UnknownRenameSource {
                from: from.clone(),
                to: to.clone(),
                path: path.to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let name = rename_map
            .get(field.name())
            .cloned()
            .unwrap_or_else(|| field.name().clone());

        if !seen.insert(name.clone()) {
            return Err(SourceError::RenameCollision { column: name });
        }
        fields.push(field.as_ref().clone().with_name(name));
    }

    let renamed = Schema::new_with_metadata(fields, schema.metadata().clone());
    RecordBatch::try_new(Arc::new(renamed), batch.columns().to_vec()).context(ArrowSnafu)
}

fn is_string_like(datatype: &DataType) -> bool {
    matches!(
        datatype,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Replace column `idx` of `batch`, updating the field type to match.
fn replace_column(
    batch: &RecordBatch,
    idx: usize,
    column: Arc<dyn Array>,
) -> SourceResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields[idx] = fields[idx].clone().with_data_type(column.data_type().clone());

    let mut columns = batch.columns().to_vec();
    columns[idx] = column;

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    RecordBatch::try_new(Arc::new(schema), columns).context(ArrowSnafu)
}

fn canonicalize_pv_id(
    batch: RecordBatch,
    id_dim_name: &str,
    path: &str,
) -> SourceResult<RecordBatch> {
    let idx = batch
        .schema()
        .index_of(PV_ID_COLUMN)
        .map_err(|_| SourceError::MissingDimension {
            dimension: "id",
            column: PV_ID_COLUMN.to_string(),
            path: path.to_string(),
        })?;

    let col = batch.column(idx);
    let supported = match col.data_type() {
        DataType::Dictionary(_, values) => is_string_like(values),
        other => is_string_like(other),
    };
    if !supported {
        return Err(SourceError::UnsupportedIdType {
            column: id_dim_name.to_string(),
            datatype: col.data_type().clone(),
        });
    }

    if col.null_count() > 0 {
        return Err(SourceError::NullPvId {
            path: path.to_string(),
            column: id_dim_name.to_string(),
            null_count: col.null_count(),
        });
    }

    if col.data_type() == &DataType::Utf8 {
        return Ok(batch);
    }

    let canonical = cast(col, &DataType::Utf8).context(ArrowSnafu)?;
    replace_column(&batch, idx, canonical)
}

fn validate_timestamps(
    batch: RecordBatch,
    timestamp_dim_name: &str,
    path: &str,
) -> SourceResult<(RecordBatch, TimeUnit)> {
    let idx = batch
        .schema()
        .index_of(TS_COLUMN)
        .map_err(|_| SourceError::MissingDimension {
            dimension: "timestamp",
            column: TS_COLUMN.to_string(),
            path: path.to_string(),
        })?;

    let col = batch.column(idx);
    let unit = match col.data_type() {
        DataType::Timestamp(unit, _) => *unit,
        other => {
            return Err(SourceError::UnsupportedTimeType {
                column: timestamp_dim_name.to_string(),
                datatype: other.clone(),
            });
        }
    };

    if col.null_count() == 0 {
        return Ok((batch, unit));
    }

    warn!(
        "dropping {} rows with a null timestamp from {path}",
        col.null_count()
    );
    let mask = is_not_null(col).context(ArrowSnafu)?;
    let filtered = filter_record_batch(&batch, &mask).context(ArrowSnafu)?;
    Ok((filtered, unit))
}

/// Distinct ids in first-appearance order, taken before any row is dropped.
fn collect_pv_ids(batch: &RecordBatch, path: &str) -> SourceResult<(Vec<PvId>, HashSet<PvId>)> {
    let values = pv_id_column(batch, path)?;

    let mut pv_ids = Vec::new();
    let mut pv_id_set = HashSet::new();
    for id in values.iter().flatten() {
        if pv_id_set.insert(id.to_string()) {
            pv_ids.push(id.to_string());
        }
    }
    Ok((pv_ids, pv_id_set))
}

fn pv_id_column(batch: &RecordBatch, path: &str) -> SourceResult<StringArray> {
    batch
        .column_by_name(PV_ID_COLUMN)
        .and_then(|c| c.as_string_opt::<i32>())
        .cloned()
        .ok_or_else(|| SourceError::MissingDimension {
            dimension: "id",
            column: PV_ID_COLUMN.to_string(),
            path: path.to_string(),
        })
}

fn build_store(
    batch: RecordBatch,
    ts_unit: TimeUnit,
    pv_ids: Vec<PvId>,
    pv_id_set: HashSet<PvId>,
    path: &str,
) -> SourceResult<ObservationStore> {
    let pv_id_values = pv_id_column(&batch, path)?;

    let ts_col = batch
        .column_by_name(TS_COLUMN)
        .ok_or_else(|| SourceError::MissingDimension {
            dimension: "timestamp",
            column: TS_COLUMN.to_string(),
            path: path.to_string(),
        })?;
    let ts_values = cast(ts_col, &DataType::Int64)
        .context(ArrowSnafu)?
        .as_primitive::<Int64Type>()
        .clone();

    let to_ts = |raw: Option<i64>| -> SourceResult<Timestamp> {
        let raw = raw.context(EmptyStoreSnafu { path })?;
        from_unit(raw, ts_unit).ok_or_else(|| SourceError::TimestampOutOfRange {
            path: path.to_string(),
            value: raw,
        })
    };
    let ts_min = to_ts(arrow::compute::min(&ts_values))?;
    let ts_max = to_ts(arrow::compute::max(&ts_values))?;

    Ok(ObservationStore {
        batch,
        pv_id_values,
        ts_values,
        ts_unit,
        pv_ids,
        pv_id_set,
        ts_min,
        ts_max,
    })
}
