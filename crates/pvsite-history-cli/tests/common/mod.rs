use std::{fs::File, path::Path, sync::Arc};

use arrow::array::{Float64Array, Int64Array, RecordBatch, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use parquet::arrow::ArrowWriter;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// 2020-01-01T00:00:00Z
const BASE_TS: i64 = 1_577_836_800;

/// Sites 101 and 202 (integer ids in `ss_id`), hourly readings in
/// `timestamp` for `hours` hours starting 2020-01-01T00:00Z.
pub fn write_hourly_sites(path: &Path, hours: i64) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut ids = Vec::new();
    let mut ts = Vec::new();
    let mut power = Vec::new();
    for hour in 0..hours {
        for site in [101_i64, 202] {
            ids.push(site);
            ts.push(BASE_TS + hour * 3_600);
            power.push(hour as f64 * 0.5);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("ss_id", DataType::Int64, false),
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
        Field::new("generation_kw", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(TimestampSecondArray::from(ts)),
            Arc::new(Float64Array::from(power)),
        ],
    )?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
