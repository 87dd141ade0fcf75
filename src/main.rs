//! sheetdiff - Spreadsheet reconciliation and keyed merge

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sheetdiff::config::{Config, MergeConfig, OutputFormat};
use sheetdiff::diff::SetReconciler;
use sheetdiff::merge::{JoinKind, KeyedMerger};
use sheetdiff::model::Table;
use sheetdiff::output::{
    merge_workbook, reconciliation_workbook, render_merge_to_stdout,
    render_reconciliation_to_stdout, xlsx::write_workbook,
};
use sheetdiff::parser::{ParserFactory, ReadOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
    Xlsx,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Xlsx => OutputFormat::Xlsx,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliJoin {
    Left,
    Inner,
}

impl From<CliJoin> for JoinKind {
    fn from(j: CliJoin) -> Self {
        match j {
            CliJoin::Left => JoinKind::Left,
            CliJoin::Inner => JoinKind::Inner,
        }
    }
}

/// Reconcile and merge spreadsheets (CSV, TSV, Excel)
#[derive(Parser, Debug)]
#[command(name = "sheetdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List rows present in only one of two identically shaped files
    Compare(CompareArgs),
    /// Join two files on positionally paired key columns
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Source file
    source: PathBuf,

    /// Target file
    target: PathBuf,

    /// Column(s) used to pair differing rows for cell highlighting (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Write the differences workbook to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// For Excel files: which sheet to compare
    #[arg(long)]
    sheet: Option<String>,

    /// Only show the summary, not the differing rows
    #[arg(long)]
    stats_only: bool,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Left file; every output row comes from it
    left: PathBuf,

    /// Right file
    right: PathBuf,

    /// Key column(s) of the left file (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    left_key: Vec<String>,

    /// Key column(s) of the right file, paired by position with --left-key
    #[arg(long, value_delimiter = ',', required = true)]
    right_key: Vec<String>,

    /// Columns kept from the left file (defaults to its keys)
    #[arg(long, value_delimiter = ',')]
    left_select: Vec<String>,

    /// Columns kept from the right file (defaults to its keys)
    #[arg(long, value_delimiter = ',')]
    right_select: Vec<String>,

    /// Keep unmatched left rows (left) or drop them (inner)
    #[arg(long, value_enum, default_value = "left")]
    join: CliJoin,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Write the merged workbook to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// For Excel files: which sheet to read
    #[arg(long)]
    sheet: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(has_differences) => {
            if has_differences {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    match cli.command {
        Command::Compare(args) => {
            let mut config = Config::new(args.source, args.target)
                .with_key_columns(args.key)
                .with_output_format(args.format.into())
                .with_stats_only(args.stats_only);
            if let Some(path) = args.output {
                config = config.with_output_path(path);
            }
            if let Some(sheet) = args.sheet {
                config = config.with_sheet_name(sheet);
            }
            run_compare(&config)
        }
        Command::Merge(args) => {
            let mut config = MergeConfig::new(args.left, args.right)
                .with_keys(args.left_key, args.right_key)
                .with_select(args.left_select, args.right_select)
                .with_join_kind(args.join.into())
                .with_output_format(args.format.into());
            if let Some(path) = args.output {
                config = config.with_output_path(path);
            }
            if let Some(sheet) = args.sheet {
                config = config.with_sheet_name(sheet);
            }
            run_merge(&config)?;
            Ok(false)
        }
    }
}

fn read_table(factory: &ParserFactory, path: &Path, options: &ReadOptions) -> Result<Table> {
    factory
        .parse(path, options)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

fn require_output_path(format: OutputFormat, output: Option<&PathBuf>) -> Result<()> {
    if format == OutputFormat::Xlsx && output.is_none() {
        bail!("xlsx output needs a destination; pass --output <PATH>");
    }
    Ok(())
}

fn run_compare(config: &Config) -> Result<bool> {
    require_output_path(config.output_format, config.output_path.as_ref())?;

    let factory = ParserFactory::new();
    let options = config.read_options();
    let source = read_table(&factory, &config.source_file, &options)?;
    let target = read_table(&factory, &config.target_file, &options)?;

    let result = SetReconciler::new()
        .with_key_columns(config.key_columns.clone())
        .reconcile(source, target)
        .context("Failed to compare files")?;

    if let Some(path) = &config.output_path {
        let bytes = reconciliation_workbook(&result)?;
        write_workbook(path, &bytes)?;
    }

    render_reconciliation_to_stdout(&result, config.output_format, config.stats_only)?;
    Ok(result.has_differences())
}

fn run_merge(config: &MergeConfig) -> Result<()> {
    require_output_path(config.output_format, config.output_path.as_ref())?;

    let factory = ParserFactory::new();
    let options = config.read_options();
    let left = read_table(&factory, &config.left_file, &options)?;
    let right = read_table(&factory, &config.right_file, &options)?;

    let merged = KeyedMerger::new(config.merge_spec())
        .merge(&left, &right)
        .context("Failed to merge files")?;

    if let Some(path) = &config.output_path {
        let bytes = merge_workbook(&merged)?;
        write_workbook(path, &bytes)?;
    }

    render_merge_to_stdout(&merged, config.output_format)
}
