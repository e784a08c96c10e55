use std::{fs::File, io::Write, path::Path};

use arrow::{
    array::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use snafu::ResultExt;
use tabled::{builder::Builder, settings::Style};

use crate::error::{ArrowSnafu, CliResult, StdoutSnafu, WriteOutputSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

/// Format the first `max_rows` rows of `batch` as display strings.
pub fn preview_rows(batch: &RecordBatch, max_rows: usize) -> CliResult<Vec<Vec<String>>> {
    let options = FormatOptions::default();
    let formatters = batch
        .columns()
        .iter()
        .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
        .collect::<Result<Vec<_>, _>>()
        .context(ArrowSnafu)?;

    let rows_to_take = max_rows.min(batch.num_rows());
    Ok((0..rows_to_take)
        .map(|row| formatters.iter().map(|f| f.value(row).to_string()).collect())
        .collect())
}

pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn write_observations<W: Write>(
    batch: &RecordBatch,
    max_rows: usize,
    out: &mut W,
) -> CliResult<()> {
    let columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    if max_rows > 0 && batch.num_rows() > 0 {
        let rows = preview_rows(batch, max_rows)?;
        writeln!(out, "{}", render_table(&columns, &rows)).context(StdoutSnafu)?;
    }

    if batch.num_rows() == 0 {
        writeln!(out, "(no rows)").context(StdoutSnafu)?;
    } else if max_rows == 0 {
        writeln!(out, "(preview suppressed; use --max-rows > 0)").context(StdoutSnafu)?;
    }

    writeln!(out, "total_rows: {}", batch.num_rows()).context(StdoutSnafu)?;
    Ok(())
}

/// Write the full batch to `path` in `format`.
pub fn export_observations(
    batch: &RecordBatch,
    path: &Path,
    format: OutputFormat,
) -> CliResult<()> {
    let file = File::create(path).context(WriteOutputSnafu { path })?;

    match format {
        OutputFormat::Csv => {
            let mut writer = arrow_csv::WriterBuilder::new().with_header(true).build(file);
            writer.write(batch).context(ArrowSnafu)?;
        }
        OutputFormat::Jsonl => {
            let mut writer = arrow_json::LineDelimitedWriter::new(file);
            writer.write_batches(&[batch]).context(ArrowSnafu)?;
            writer.finish().context(ArrowSnafu)?;
        }
    }
    Ok(())
}
