use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use surch::{Config, SearchReport, SearchRequest, SurchClient, SurchError};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(
    name = "surch",
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("SURCH_SOURCE_REVISION"),
        ", built ",
        env!("SURCH_BUILD_DATE"),
        ")"
    ),
    about = "Search a git repository's entire history for strings"
)]
struct Args {
    /// Clone URL, path to a local working copy, or `:org/repo` shorthand
    reference: String,
    /// Literal strings to look for; a file matches if it contains any of them
    #[arg(required = true)]
    terms: Vec<String>,
    /// Directory to write results.json to (default: per-organization results dir)
    #[arg(long, short = 'r')]
    results_dir: Option<PathBuf>,
    /// Root directory to clone into, as {org}/{repo}
    #[arg(long, short = 'c')]
    clone_dir: Option<PathBuf>,
    /// Use an existing clone as-is instead of pulling
    #[arg(long, alias = "no-sync")]
    skip_update: bool,
    /// Move an existing results.json aside before writing
    #[arg(long)]
    rotate: bool,
    /// Delete the clone once results are written
    #[arg(long)]
    remove_clone: bool,
    /// Print the records found by this run as JSON
    #[arg(long, short = 'p')]
    print: bool,
    /// Number of commits searched concurrently
    #[arg(long, env = "SURCH_WORKERS")]
    workers: Option<usize>,
    /// Stop scanning after this many seconds and keep what was found
    #[arg(long)]
    timeout: Option<u64>,
    /// Configuration file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = Config::from_file(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                config.apply_env_overrides();
                config
            }
            None => Config::new().context("Failed to load configuration")?,
        };

        if let Some(workers) = self.workers {
            config.scan.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.scan.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    fn request(&self) -> SearchRequest {
        SearchRequest {
            reference: self.reference.clone(),
            search_terms: self.terms.clone(),
            results_dir: self.results_dir.clone(),
            clone_dir: self.clone_dir.clone(),
            skip_update: self.skip_update,
            rotate_results: self.rotate,
            remove_clone: self.remove_clone,
        }
    }
}

fn print_records(report: &SearchReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report.records)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = args.load_config()?;
    let client = SurchClient::with_config(config)?
        .with_span(tracing::info_span!("surch", reference = %args.reference));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing in-flight commits");
                cancel.cancel();
            }
        }
    });

    match client.search(args.request(), cancel).await {
        Ok(report) => {
            if args.print {
                print_records(&report)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(SurchError::Interrupted(report)) => {
            if args.print {
                print_records(&report)?;
            }
            tracing::warn!(
                "Partial results ({} of {} commits) written to {}",
                report.commits_scanned,
                report.commits_total,
                report.results_path.display()
            );
            Ok(ExitCode::from(130))
        }
        Err(e) if e.is_user_error() => {
            tracing::error!("{}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}
