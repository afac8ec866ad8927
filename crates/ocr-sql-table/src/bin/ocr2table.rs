use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ocr_sql_table::{
    ChartKind, ChartOptions, ExtractOptions, Extraction, OutputFormat, QueryAnalysis,
    analyze_query, extract, extract_sql_query, rows_to_csv_string, write_rows_csv,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ocr2table",
    version,
    about = "Recover SQL queries and result tables from OCR text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the result table and write it as JSON or CSV.
    Extract(ExtractArgs),
    /// Print the embedded SQL query and its analysis.
    Query(InputArgs),
    /// Print chart data for the extracted table.
    Chart(ChartArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Input text path. Reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output path. Writes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: json or csv.
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Do not guess name/score rows when no header is found.
    #[arg(long)]
    no_synthetic: bool,

    /// Non-empty lines scanned for a header row.
    #[arg(long, default_value_t = 20)]
    header_scan_limit: usize,

    /// Data lines examined after the header.
    #[arg(long, default_value_t = 30)]
    max_data_rows: usize,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ChartArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Chart kind: bar, pie or line. Suggested from the data when omitted.
    #[arg(long)]
    kind: Option<ChartKind>,
}

#[derive(Debug, Serialize)]
struct QueryReport {
    query: String,
    analysis: Option<QueryAnalysis>,
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let options = ExtractOptions {
        header_scan_limit: args.header_scan_limit,
        max_data_rows: args.max_data_rows,
        synthetic_fallback: !args.no_synthetic,
        ..ExtractOptions::default()
    };
    options.validate()?;
    Ok(options)
}

fn log_warnings(extraction: &Extraction, verbose: bool) {
    if extraction.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", extraction.warnings.len());
    if verbose {
        for warning in &extraction.warnings {
            eprintln!(
                "  - {:?} line={:?} rows={:?}: {}",
                warning.code, warning.line, warning.row_count, warning.message
            );
        }
    }
}

fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<Extraction> {
    let options = parse_options(args)?;
    let text = read_input(args.input.input.as_deref())?;
    let extraction = extract(&text, &options)?;
    let output = args.output.as_deref();

    match (args.format, extraction.table.as_ref()) {
        (OutputFormat::Json, _) => {
            let json = serde_json::to_string_pretty(&extraction)
                .context("failed to serialize extraction")?;
            emit(output, &json)?;
        }
        (OutputFormat::Csv, Some(table)) => match output {
            Some(path) => write_rows_csv(path, table, args.delimiter as u8)
                .with_context(|| format!("failed to write '{}'", path.display()))?,
            None => print!("{}", rows_to_csv_string(table, args.delimiter as u8)?),
        },
        (OutputFormat::Csv, None) => {}
    }

    Ok(extraction)
}

fn run_query(args: &InputArgs) -> Result<Option<QueryReport>> {
    let text = read_input(args.input.as_deref())?;
    let Some(query) = extract_sql_query(&text) else {
        return Ok(None);
    };

    let report = QueryReport {
        analysis: analyze_query(&query),
        query,
    };
    emit(
        None,
        &serde_json::to_string_pretty(&report).context("failed to serialize query")?,
    )?;
    Ok(Some(report))
}

fn run_chart(args: &ChartArgs) -> Result<bool> {
    let text = read_input(args.input.input.as_deref())?;
    let extraction = extract(&text, &ExtractOptions::default())?;
    let Some(chart) = extraction.chart(args.kind, &ChartOptions::default()) else {
        return Ok(false);
    };

    emit(
        None,
        &serde_json::to_string_pretty(&chart).context("failed to serialize chart")?,
    )?;
    Ok(true)
}

fn exit_code(found: Result<bool>) -> ExitCode {
    match found {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ocr_sql_table=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => exit_code(run_extract(&args).map(|extraction| {
            log_warnings(&extraction, args.verbose);
            extraction.table.is_some()
        })),
        Commands::Query(args) => exit_code(run_query(&args).map(|report| report.is_some())),
        Commands::Chart(args) => exit_code(run_chart(&args)),
    }
}
