//! CLI tool for inspecting PV history files through the leakage-safe data source.

mod error;
mod output;
mod time_arg;

use std::{collections::BTreeMap, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use pvsite_history_core::{
    DataSourceSnapshot, ParquetPvDataSource, PvDataSource, PvSelection, SourceConfig,
    storage::StorageLocation,
};
use snafu::ResultExt;

use crate::{
    error::{
        CliError, CliResult, InvalidLocationSnafu, InvalidRenameSnafu, MissingSourceSnafu,
        OpenSourceSnafu, QuerySnafu, RestoreSnapshotSnafu, SerializeSnapshotSnafu, StdoutSnafu,
        WriteOutputSnafu,
    },
    output::{OutputFormat, export_observations, write_observations},
    time_arg::{parse_optional, parse_timestamp},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Jsonl,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Parquet file with one row per PV id and timestamp (path or file:// URL)
    #[arg(long, conflicts_with = "snapshot")]
    file: Option<String>,

    /// Restore the data source from a JSON snapshot instead of --file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Physical name of the timestamp column
    #[arg(
        long = "time-column",
        default_value = "ts",
        conflicts_with = "snapshot"
    )]
    time_column: String,

    /// Physical name of the PV id column
    #[arg(
        long = "id-column",
        default_value = "pv_id",
        conflicts_with = "snapshot"
    )]
    id_column: String,

    /// Repeatable column rename, FROM=TO
    #[arg(long = "rename", conflicts_with = "snapshot")]
    rename: Vec<String>,

    /// Hide everything at or after this time ("now")
    #[arg(long)]
    now: Option<String>,

    /// Minutes before --now that are hidden as well
    #[arg(long, default_value_t = 0, requires = "now")]
    blackout: u32,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List PV ids in the backing file
    Ids,

    /// Print the visible timestamp bounds and the cutoff
    Bounds,

    /// Fetch a window of observations
    Get {
        /// Repeatable PV id
        #[arg(long = "id", required = true)]
        id: Vec<String>,

        /// Inclusive window start
        #[arg(long)]
        start: Option<String>,

        /// Inclusive window end (further limited by --now)
        #[arg(long)]
        end: Option<String>,

        /// Rows to show in the preview table (0 hides the preview)
        #[arg(long, default_value_t = 10)]
        max_rows: usize,

        /// Write the full window to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// File format used with --output
        #[arg(long, value_enum, default_value_t = OutputFormatArg::Csv)]
        format: OutputFormatArg,
    },

    /// Print the data source snapshot (configuration and cutoff) as JSON
    Snapshot {
        /// Write the snapshot to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Parser)]
#[command(name = "pvhist")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    cmd: Command,
}

fn parse_renames(specs: &[String]) -> CliResult<BTreeMap<String, String>> {
    specs
        .iter()
        .map(|spec| match spec.split_once('=') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() => {
                Ok((from.to_string(), to.to_string()))
            }
            _ => InvalidRenameSnafu { spec: spec.clone() }.fail(),
        })
        .collect()
}

fn open_source(args: &SourceArgs) -> CliResult<ParquetPvDataSource> {
    let ds = match (&args.snapshot, &args.file) {
        (Some(path), _) => {
            let path_str = path.display().to_string();
            DataSourceSnapshot::from_json_file(path)
                .and_then(ParquetPvDataSource::restore)
                .context(RestoreSnapshotSnafu { path: path_str })?
        }
        (None, Some(file)) => {
            let location = StorageLocation::parse(file).context(InvalidLocationSnafu)?;
            let path = location.display();
            let mut config = SourceConfig::new(location)
                .with_timestamp_dim_name(&args.time_column)
                .with_id_dim_name(&args.id_column);
            config.rename = parse_renames(&args.rename)?;

            ParquetPvDataSource::open(config)
                .context(OpenSourceSnafu { path })?
        }
        (None, None) => return MissingSourceSnafu.fail(),
    };

    match args.now.as_deref() {
        Some(now) => {
            let now = parse_timestamp(now)?;
            debug!("hiding data from {now} minus {} minutes", args.blackout);
            Ok(ds.without_future(now, args.blackout))
        }
        None => Ok(ds),
    }
}

fn cmd_ids(ds: &ParquetPvDataSource) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    for id in ds.list_pv_ids() {
        writeln!(stdout, "{id}").context(StdoutSnafu)?;
    }
    Ok(())
}

fn cmd_bounds(ds: &ParquetPvDataSource) -> CliResult<()> {
    let cutoff = ds
        .cutoff()
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "none".to_string());

    println!("min_ts: {}", ds.min_ts().to_rfc3339());
    println!("max_ts: {}", ds.max_ts().to_rfc3339());
    println!("cutoff: {cutoff}");
    Ok(())
}

struct GetArgs {
    id: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    max_rows: usize,
    output: Option<PathBuf>,
    format: OutputFormatArg,
}

fn cmd_get(ds: &ParquetPvDataSource, args: GetArgs) -> CliResult<()> {
    let start = parse_optional(args.start.as_deref())?;
    let end = parse_optional(args.end.as_deref())?;

    let selection = match args.id.as_slice() {
        [single] => PvSelection::from(single.clone()),
        _ => PvSelection::Many(args.id),
    };

    let obs = ds.get(&selection, start, end).context(QuerySnafu)?;

    let mut stdout = std::io::stdout().lock();
    write_observations(obs.batch(), args.max_rows, &mut stdout)?;

    if let Some(path) = &args.output {
        export_observations(obs.batch(), path, args.format.into())?;
        writeln!(stdout, "wrote: {} ({:?})", path.display(), args.format)
            .context(StdoutSnafu)?;
    }
    Ok(())
}

fn cmd_snapshot(ds: &ParquetPvDataSource, output: Option<PathBuf>) -> CliResult<()> {
    let json =
        serde_json::to_string_pretty(&ds.snapshot()).context(SerializeSnapshotSnafu)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json).context(WriteOutputSnafu { path: path.clone() })?;
            println!("wrote: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let ds = open_source(&cli.source)?;

    match cli.cmd {
        Command::Ids => cmd_ids(&ds),
        Command::Bounds => cmd_bounds(&ds),
        Command::Get {
            id,
            start,
            end,
            max_rows,
            output,
            format,
        } => cmd_get(
            &ds,
            GetArgs {
                id,
                start,
                end,
                max_rows,
                output,
                format,
            },
        ),
        Command::Snapshot { output } => cmd_snapshot(&ds, output),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        report(&e);
        std::process::exit(1);
    }
}

fn report(e: &CliError) {
    eprintln!("{e}");

    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}
