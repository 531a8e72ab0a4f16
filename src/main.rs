mod extras;
mod report;
mod vehicle;
mod walk;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Flatten browsertime mobile page-load results into a CSV report.
///
/// Walks one or more result directories for replay-mode `browsertime.json`
/// files, merges each directory's `run.json` metadata into every
/// measurement, and writes the combined table to stdout. Diagnostics go to
/// stderr so the CSV stream stays clean.
#[derive(Parser, Debug)]
#[command(name = "browsertime-report", version, about)]
pub struct Cli {
    /// Directory or directories to crawl for results
    #[arg(short = 'D', long = "dir", num_args = 1.., default_value = "browsertime-results")]
    dir: Vec<PathBuf>,

    /// Be verbose (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let stdout = std::io::stdout();
    if let Err(e) = report::write_report(&cli.dir, stdout.lock()) {
        tracing::error!(error = %e, "report aborted");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
