mod config;
mod dashboard;
mod ingest;
mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use logtally_analytics::AnalyticsEngine;
use logtally_store::{FileStore, MemoryStore};

use crate::config::Config;
use crate::report::{ReportKind, ReportOptions};

/// logtally - ingest HTTP access logs and report traffic analytics
#[derive(Parser, Debug)]
#[command(name = "logtally")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file [default: logtally.toml when present]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Record store file, overriding the config
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an access log file and store its records
    #[command(alias = "process_logs")]
    Ingest {
        /// Access log in common log format
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Parse and batch into memory without touching the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Print an analytics report
    #[command(alias = "generate_report")]
    Report {
        #[arg(value_enum, value_name = "KIND")]
        kind: ReportKind,

        /// Rows in ranked reports
        #[arg(long, value_name = "N")]
        top: Option<usize>,

        /// Daily traffic window in days
        #[arg(long, value_name = "N")]
        days: Option<u32>,
    },

    /// Interactive terminal dashboard
    Dashboard {
        /// Seconds between automatic refreshes, 0 to disable
        #[arg(long, value_name = "SECS")]
        refresh: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(io::stderr)
        .init();

    match run_app(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(args: Args, config: Config) -> Result<()> {
    let store_path = args.store.unwrap_or(config.store.path);

    match args.command {
        Command::Ingest { file, dry_run } => {
            let mut stdout = io::stdout().lock();
            let summary = if dry_run {
                ingest::run(&MemoryStore::new(), &file, &mut stdout)?
            } else {
                let store = open_store(&store_path)?;
                ingest::run(&store, &file, &mut stdout)?
            };
            stdout.flush()?;

            if !summary.is_success() {
                if let Some(e) = summary.error {
                    return Err(e).context(format!(
                        "Ingestion stopped after {} records",
                        summary.outcome.total_persisted
                    ));
                }
                if let Some(e) = summary.stats.read_error {
                    anyhow::bail!("Failed reading {}: {}", file.display(), e);
                }
                anyhow::bail!("Ingestion of {} did not complete", file.display());
            }
        }

        Command::Report { kind, top, days } => {
            let engine = AnalyticsEngine::new(open_store(&store_path)?);
            let opts = ReportOptions {
                top_n: top.unwrap_or(config.reports.top_n),
                days: days.unwrap_or(config.reports.days),
            };

            let mut stdout = io::stdout().lock();
            report::write_report(&mut stdout, &engine, kind, opts)?;
            stdout.flush()?;
        }

        Command::Dashboard { refresh } => {
            let engine = Arc::new(AnalyticsEngine::new(open_store(&store_path)?));
            let refresh_every =
                Duration::from_secs(refresh.unwrap_or(config.dashboard.refresh_secs));
            dashboard::run(
                engine,
                config.reports.top_n,
                config.reports.days,
                refresh_every,
            )
            .await?;
        }
    }

    Ok(())
}

fn open_store(path: &Path) -> Result<FileStore> {
    let store = FileStore::open(path)
        .with_context(|| format!("Failed to open record store {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Record store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_report_aliases() {
        let args = Args::try_parse_from(["logtally", "generate_report", "top_n_ips"]).unwrap();
        match args.command {
            Command::Report { kind, .. } => assert_eq!(kind, ReportKind::TopIps),
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from([
            "logtally",
            "report",
            "resource-analysis",
            "--top",
            "3",
            "--store",
            "/tmp/records.jsonl",
        ])
        .unwrap();
        assert_eq!(args.store, Some(PathBuf::from("/tmp/records.jsonl")));
        match args.command {
            Command::Report { kind, top, days } => {
                assert_eq!(kind, ReportKind::ResourceAnalysis);
                assert_eq!(top, Some(3));
                assert_eq!(days, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_report_rejected() {
        assert!(Args::try_parse_from(["logtally", "report", "save_charts"]).is_err());
    }

    #[test]
    fn test_ingest_flags() {
        let args =
            Args::try_parse_from(["logtally", "ingest", "access.log", "--dry-run"]).unwrap();
        match args.command {
            Command::Ingest { file, dry_run } => {
                assert_eq!(file, PathBuf::from("access.log"));
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
