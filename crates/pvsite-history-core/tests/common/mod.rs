use std::{fs::File, path::Path, sync::Arc};

use arrow::array::{ArrayRef, Float64Array, RecordBatch, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, TimeZone, Utc};
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid UTC timestamp")
}

/// Write `rows` of `(pv_id, ts, power)` to a Parquet file with canonical
/// column names.
pub fn write_rows(path: &Path, rows: &[(&str, DateTime<Utc>, f64)]) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("pv_id", DataType::Utf8, false),
        Field::new("ts", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("power", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0))),
        Arc::new(TimestampMillisecondArray::from_iter_values(
            rows.iter().map(|r| r.1.timestamp_millis()),
        )),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.2))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Sites `A` and `B`, one reading per day from 2020-01-01 to 2020-01-10, plus
/// hourly readings for `A` on 2020-01-04.
pub fn write_scenario_store(path: &Path) -> TestResult {
    let mut rows = Vec::new();
    for day in 1..=10 {
        rows.push(("A", utc(2020, 1, day, 0, 0, 0), f64::from(day)));
        rows.push(("B", utc(2020, 1, day, 0, 0, 0), f64::from(day) * 2.0));
    }
    for hour in 1..24 {
        rows.push(("A", utc(2020, 1, 4, hour, 0, 0), f64::from(hour) / 10.0));
    }
    write_rows(path, &rows)
}
