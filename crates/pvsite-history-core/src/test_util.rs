use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray, TimestampMillisecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, TimeZone, Utc};
use parquet::arrow::ArrowWriter;

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn utc_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid UTC timestamp")
}

pub(crate) fn write_batch(path: &Path, batch: &RecordBatch) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Sites `A` and `B` with one reading per day from 2020-01-01 to 2020-01-10.
///
/// Rows are interleaved by day (`A`, `B`, `A`, `B`, ...) with
/// `power = day_index * 10 + site_index`.
pub(crate) fn daily_batch(id_column: &str, ts_column: &str) -> RecordBatch {
    let mut ids = Vec::new();
    let mut ts = Vec::new();
    let mut power = Vec::new();

    for day in 0..10u32 {
        for (site_idx, site) in ["A", "B"].iter().enumerate() {
            ids.push(*site);
            ts.push(utc_datetime(2020, 1, day + 1, 0, 0, 0).timestamp_millis());
            power.push(f64::from(day * 10) + site_idx as f64);
        }
    }

    let schema = Schema::new(vec![
        Field::new(id_column, DataType::Utf8, false),
        Field::new(
            ts_column,
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("power", DataType::Float64, true),
    ]);

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(TimestampMillisecondArray::from(ts).with_timezone("UTC")),
        Arc::new(Float64Array::from(power)),
    ];

    RecordBatch::try_new(Arc::new(schema), columns).expect("valid daily batch")
}

pub(crate) fn write_daily_fixture(path: &Path) -> TestResult {
    write_batch(path, &daily_batch("pv_id", "ts"))
}

/// Integer site ids in `ss_id`, naive second-resolution timestamps in
/// `datetime`, and a `generation_wh` value column.
pub(crate) fn write_integer_id_fixture(
    path: &Path,
    rows: &[(i64, DateTime<Utc>, f64)],
) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("ss_id", DataType::Int64, false),
        Field::new(
            "datetime",
            DataType::Timestamp(TimeUnit::Second, None),
            true,
        ),
        Field::new("generation_wh", DataType::Float64, true),
    ]);

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.0))),
        Arc::new(TimestampSecondArray::from_iter_values(rows.iter().map(|r| r.1.timestamp()))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.2))),
    ];

    write_batch(path, &RecordBatch::try_new(Arc::new(schema), columns)?)
}
