//! Window selection over an `ObservationStore`.
//!
//! Selection builds a boolean mask per requested PV id with Arrow's
//! comparison kernels and applies it with `filter_record_batch`:
//!
//! - Time bounds are inclusive on both ends. They are converted into the
//!   column's unit with the lower bound rounded up and the upper bound rounded
//!   down, so a bound that falls between two representable values still
//!   compares exactly.
//! - Bounds are compared as `Scalar` datums, which the kernels broadcast
//!   across the column without materializing a full-length bound array.
//! - The time mask is computed once and combined with each id mask; results
//!   are concatenated in request order.

use arrow::{
    array::{BooleanArray, Int64Array, RecordBatch, StringArray},
    compute::{
        concat_batches, filter_record_batch,
        kernels::{boolean as boolean_kernels, cmp as cmp_kernels},
    },
};
use snafu::prelude::*;

use crate::{
    parquet_source::open::ObservationStore,
    source::{
        PvId,
        error::{ArrowSnafu, SourceResult},
    },
    timestamp::{Timestamp, to_unit_ceil, to_unit_floor},
};

/// Combine two optional masks with logical AND. `None` means "all rows".
fn and_masks(
    a: Option<BooleanArray>,
    b: Option<BooleanArray>,
) -> SourceResult<Option<BooleanArray>> {
    match (a, b) {
        (Some(a), Some(b)) => Ok(Some(boolean_kernels::and(&a, &b).context(ArrowSnafu)?)),
        (a, None) => Ok(a),
        (None, b) => Ok(b),
    }
}

impl ObservationStore {
    fn time_mask(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SourceResult<Option<BooleanArray>> {
        let lower = match start {
            Some(start) => {
                let bound = Int64Array::new_scalar(to_unit_ceil(start, self.ts_unit));
                Some(cmp_kernels::gt_eq(&self.ts_values, &bound).context(ArrowSnafu)?)
            }
            None => None,
        };

        let upper = match end {
            Some(end) => {
                let bound = Int64Array::new_scalar(to_unit_floor(end, self.ts_unit));
                Some(cmp_kernels::lt_eq(&self.ts_values, &bound).context(ArrowSnafu)?)
            }
            None => None,
        };

        and_masks(lower, upper)
    }

    /// Rows for `pv_ids` (in request order) with `start <= ts <= end`.
    ///
    /// Callers must have checked that every id exists.
    pub(crate) fn select(
        &self,
        pv_ids: &[PvId],
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SourceResult<RecordBatch> {
        let schema = self.batch.schema();

        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Ok(RecordBatch::new_empty(schema));
        }

        let time_mask = self.time_mask(start, end)?;

        let mut parts = Vec::with_capacity(pv_ids.len());
        for pv_id in pv_ids {
            let id_scalar = StringArray::new_scalar(pv_id);
            let id_mask = cmp_kernels::eq(&self.pv_id_values, &id_scalar).context(ArrowSnafu)?;

            let mask = match &time_mask {
                Some(time_mask) => boolean_kernels::and(&id_mask, time_mask).context(ArrowSnafu)?,
                None => id_mask,
            };

            let filtered = filter_record_batch(&self.batch, &mask).context(ArrowSnafu)?;
            if filtered.num_rows() > 0 {
                parts.push(filtered);
            }
        }

        if parts.is_empty() {
            return Ok(RecordBatch::new_empty(schema));
        }

        concat_batches(&schema, &parts).context(ArrowSnafu)
    }
}
