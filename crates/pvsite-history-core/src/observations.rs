//! The observation table returned by data sources.

use arrow::{
    array::{Array, AsArray, RecordBatch},
    compute::cast,
    datatypes::{DataType, Int64Type},
};
use snafu::prelude::*;

use crate::{
    config::{PV_ID_COLUMN, TS_COLUMN},
    source::error::{ArrowSnafu, SourceError, SourceResult},
    timestamp::{Timestamp, from_unit},
};

/// Stands in for a file path in errors raised after the data left the store.
const OBSERVATIONS_PATH: &str = "<observations>";

/// A window of observations in long format: one row per (PV id, timestamp).
///
/// The table always has a Utf8 `pv_id` column and an Arrow timestamp `ts`
/// column. Any other columns are whatever the backing store carried, after
/// renames. Consumers are expected to know which of those they need.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    batch: RecordBatch,
}

impl Observations {
    pub(crate) fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// The underlying Arrow batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume the wrapper and return the Arrow batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Number of observations.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the window holds no observations.
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// PV id of every row.
    pub fn pv_ids(&self) -> SourceResult<Vec<String>> {
        let col = self.column(PV_ID_COLUMN)?;
        let ids = col
            .as_string_opt::<i32>()
            .ok_or_else(|| SourceError::UnsupportedIdType {
                column: PV_ID_COLUMN.to_string(),
                datatype: col.data_type().clone(),
            })?;

        Ok(ids.iter().flatten().map(str::to_string).collect())
    }

    /// Timestamp of every row.
    ///
    /// Fails with `TimestampOutOfRange` if a value cannot be represented.
    pub fn timestamps(&self) -> SourceResult<Vec<Timestamp>> {
        let col = self.column(TS_COLUMN)?;
        let unit = match col.data_type() {
            DataType::Timestamp(unit, _) => *unit,
            other => {
                return Err(SourceError::UnsupportedTimeType {
                    column: TS_COLUMN.to_string(),
                    datatype: other.clone(),
                });
            }
        };

        let raw = cast(col, &DataType::Int64).context(ArrowSnafu)?;
        raw.as_primitive::<Int64Type>()
            .iter()
            .flatten()
            .map(|value| {
                from_unit(value, unit).ok_or_else(|| SourceError::TimestampOutOfRange {
                    path: OBSERVATIONS_PATH.to_string(),
                    value,
                })
            })
            .collect()
    }

    fn column(&self, name: &str) -> SourceResult<&dyn Array> {
        self.batch
            .column_by_name(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| SourceError::MissingDimension {
                dimension: if name == PV_ID_COLUMN { "id" } else { "timestamp" },
                column: name.to_string(),
                path: OBSERVATIONS_PATH.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, StringArray, TimestampSecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};

    use super::*;
    use crate::test_util::utc_datetime;

    fn seconds_batch(values: Vec<i64>) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new(PV_ID_COLUMN, DataType::Utf8, false),
            Field::new(TS_COLUMN, DataType::Timestamp(TimeUnit::Second, None), false),
        ]);
        let ids = vec!["A"; values.len()];
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(TimestampSecondArray::from(values)),
        ];
        RecordBatch::try_new(Arc::new(schema), columns).expect("valid batch")
    }

    #[test]
    fn timestamps_decode_every_row() {
        let t0 = utc_datetime(2020, 1, 1, 0, 0, 0);
        let values = vec![t0.timestamp(), t0.timestamp() + 60];
        let obs = Observations::new(seconds_batch(values));

        let ts = obs.timestamps().expect("decodable timestamps");
        assert_eq!(ts, vec![t0, t0 + chrono::TimeDelta::minutes(1)]);
        assert_eq!(obs.pv_ids().expect("ids"), vec!["A", "A"]);
    }

    #[test]
    fn timestamps_reject_unrepresentable_values() {
        let obs = Observations::new(seconds_batch(vec![0, i64::MAX]));

        let err = obs.timestamps().expect_err("i64::MAX seconds is out of range");
        assert!(matches!(
            err,
            SourceError::TimestampOutOfRange {
                value: i64::MAX,
                ..
            }
        ));
    }
}
