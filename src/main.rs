use anyhow::{Context, Result};
use calculate_sales::error::UNEXPECTED_ERROR;
use calculate_sales::{run, RecordLayout, ReportMode, SalesError, Settings, ECHO_TARGET};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "calculate-sales", version)]
#[command(about = "Aggregate daily sales record files into branch and commodity totals")]
#[command(
    long_about = "Aggregate daily sales record files into branch and commodity totals.\n\n\
    Accepted definition lines and error messages are printed on stdout; \
    progress and debug logs go to stderr (filtered by RUST_LOG)."
)]
struct Cli {
    /// Directory holding the definition files and the NNNNNNNN.rcd record files
    directory: PathBuf,

    /// Optional TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lines carried by each record file (overrides settings)
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// What to do with report files left by a previous run (overrides settings)
    #[arg(long, value_enum)]
    report_mode: Option<ReportModeArg>,

    /// Print the run summary as JSON on success
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    BranchOnly,
    BranchAndCommodity,
}

impl From<LayoutArg> for RecordLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::BranchOnly => RecordLayout::BranchOnly,
            LayoutArg::BranchAndCommodity => RecordLayout::BranchAndCommodity,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportModeArg {
    Append,
    Truncate,
}

impl From<ReportModeArg> for ReportMode {
    fn from(arg: ReportModeArg) -> Self {
        match arg {
            ReportModeArg::Append => ReportMode::Append,
            ReportModeArg::Truncate => ReportMode::Truncate,
        }
    }
}

/// Outcome of reading the command line
enum Invocation {
    Run(Cli),
    /// `--help` / `--version`
    Exit(clap::Error),
    /// Wrong argument count or unknown flag
    Usage(clap::Error),
}

fn parse_args<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Invocation::Exit(err)
        }
        Err(err) => Invocation::Usage(err),
    }
}

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Exit(err) => err.exit(),
        Invocation::Usage(err) => {
            println!("{}", SalesError::Usage);
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    init_logging(&settings.log_level);

    let summary = run(&cli.directory, &settings)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to encode run summary")?;
        println!("{json}");
    }

    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings from environment".to_string(),
    })?;

    if let Some(layout) = cli.layout {
        settings.layout = layout.into();
    }
    if let Some(mode) = cli.report_mode {
        settings.report_mode = mode.into();
    }

    Ok(settings)
}

/// Echoed definition lines go to stdout as bare text, everything else to
/// stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let echo = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(filter_fn(|meta| is_echo(meta.target())));

    let logs = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_fn(|meta| !is_echo(meta.target())));

    tracing_subscriber::registry()
        .with(filter)
        .with(echo)
        .with(logs)
        .init();
}

fn is_echo(target: &str) -> bool {
    target == ECHO_TARGET
}

/// The diagnostic goes to stdout; details for operators go to the log.
fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<SalesError>() {
        Some(sales) => {
            tracing::error!(kind = sales.kind(), "run aborted: {sales:?}");
            println!("{sales}");
        }
        None => {
            eprintln!("{err:#}");
            println!("{UNEXPECTED_ERROR}");
        }
    }
}
