//! Timestamp helpers shared by every data source.
//!
//! Cutoffs are `Option<Timestamp>` where `None` means "no bound". Combining
//! two cutoffs always goes through [`combine_min`], which treats `None` as
//! +infinity so that an unbounded side never widens the result.
//!
//! The unit helpers at the bottom translate chrono timestamps to and from the
//! raw `i64` encoding of an Arrow timestamp column.

use arrow::datatypes::TimeUnit;
use chrono::{DateTime, TimeDelta, Utc};

/// A point in time. All timestamps are normalized to UTC.
pub type Timestamp = DateTime<Utc>;

/// Minimum of two optional timestamps, where `None` is greater than every
/// concrete timestamp.
///
/// The operation is commutative, associative and idempotent, so cutoffs can
/// be folded in any order.
pub fn combine_min(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Latest timestamp a model may see when "now" is `now` and the last
/// `blackout_minutes` before it must also be ignored.
///
/// One extra second is subtracted so that `now` itself is excluded. Saturates
/// at the earliest representable timestamp.
pub fn blackout_cutoff(now: Timestamp, blackout_minutes: u32) -> Timestamp {
    let margin = TimeDelta::minutes(i64::from(blackout_minutes)) + TimeDelta::seconds(1);
    now.checked_sub_signed(margin).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Encode `ts` in `unit`, rounding down. Saturates at the `i64` range.
///
/// Use this for inclusive upper bounds: `v <= floor(ts)` iff `v <= ts` for
/// every value `v` stored in `unit`.
pub(crate) fn to_unit_floor(ts: Timestamp, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Second => ts.timestamp(),
        TimeUnit::Millisecond => ts.timestamp_millis(),
        TimeUnit::Microsecond => ts.timestamp_micros(),
        TimeUnit::Nanosecond => ts.timestamp_nanos_opt().unwrap_or(if ts.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        }),
    }
}

/// Encode `ts` in `unit`, rounding up. Saturates at the `i64` range.
///
/// Use this for inclusive lower bounds.
pub(crate) fn to_unit_ceil(ts: Timestamp, unit: TimeUnit) -> i64 {
    let sub = ts.timestamp_subsec_nanos();
    let truncated = match unit {
        TimeUnit::Second => sub != 0,
        TimeUnit::Millisecond => sub % 1_000_000 != 0,
        TimeUnit::Microsecond => sub % 1_000 != 0,
        TimeUnit::Nanosecond => false,
    };

    let floor = to_unit_floor(ts, unit);
    if truncated {
        floor.saturating_add(1)
    } else {
        floor
    }
}

/// Decode a raw Arrow timestamp value. Returns `None` outside chrono's range.
pub(crate) fn from_unit(value: i64, unit: TimeUnit) -> Option<Timestamp> {
    match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(value)),
    }
}
