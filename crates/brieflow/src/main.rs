// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Brieflow - landing page in, marketing brief and ad creatives out.
//!
//! This is the binary entry point. It parses the CLI, loads and validates
//! configuration, initializes tracing, and dispatches to a subcommand.

mod compose;
mod config_cmd;
mod jobs;
mod status;

use std::path::PathBuf;

use brieflow_core::JobStatus;
use clap::{Args, Parser, Subcommand};

/// Brieflow - landing page in, marketing brief and ad creatives out.
#[derive(Parser, Debug)]
#[command(name = "brieflow", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a brief job: research, avatars, angles and offer brief.
    Run(JobArgs),
    /// Run an image job over one avatar of a finished brief.
    Images(JobArgs),
    /// Show the last recorded status of a job, or list recent jobs.
    Status(StatusArgs),
    /// Print the validated configuration with secrets redacted.
    Config,
}

/// Arguments shared by the job subcommands.
#[derive(Args, Debug)]
pub struct JobArgs {
    /// JSON payload file. Reads stdin when omitted.
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Job id to use instead of the payload's or a generated one.
    #[arg(long)]
    job_id: Option<String>,
}

/// Arguments for `brieflow status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Job to show.
    #[arg(required_unless_present = "recent", conflicts_with = "recent")]
    job_id: Option<String>,

    /// List the N most recently updated jobs instead of one job.
    #[arg(long, value_name = "N")]
    recent: Option<usize>,

    /// With --recent, only list jobs in this status (e.g. FAILED).
    #[arg(long, requires = "recent")]
    state: Option<JobStatus>,

    /// Print raw records as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => brieflow_config::load_and_validate_path(path),
        None => brieflow_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            brieflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.pipeline.log_level);

    let result = match cli.command {
        Commands::Run(args) => jobs::run_job(jobs::JobKind::Brief, &args, config).await,
        Commands::Images(args) => jobs::run_job(jobs::JobKind::Images, &args, config).await,
        Commands::Status(args) => status::run_status(&config, &args).await,
        Commands::Config => config_cmd::print_config(&config),
    };
    if let Err(e) = result {
        eprintln!("brieflow: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("brieflow={log_level},warn")));

    // Stdout carries the outcome JSON, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_payload_and_job_id() {
        let cli = Cli::try_parse_from([
            "brieflow",
            "run",
            "--payload",
            "job.json",
            "--job-id",
            "abc",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.payload, Some(PathBuf::from("job.json")));
                assert_eq!(args.job_id.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn images_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["brieflow", "images"]).unwrap();
        match cli.command {
            Commands::Images(args) => assert!(args.payload.is_none()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn status_requires_a_job_id_or_recent() {
        assert!(Cli::try_parse_from(["brieflow", "status"]).is_err());
        let cli = Cli::try_parse_from(["brieflow", "status", "abc", "--json"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.job_id.as_deref(), Some("abc"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn status_lists_recent_jobs_by_state() {
        let cli = Cli::try_parse_from(["brieflow", "status", "--recent", "5", "--state", "FAILED"])
            .unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert!(args.job_id.is_none());
                assert_eq!(args.recent, Some(5));
                assert_eq!(args.state, Some(JobStatus::Failed));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["brieflow", "status", "abc", "--recent", "5"]).is_err());
        assert!(Cli::try_parse_from(["brieflow", "status", "abc", "--state", "FAILED"]).is_err());
    }

    #[test]
    fn global_config_flag_is_accepted_after_subcommand() {
        let cli =
            Cli::try_parse_from(["brieflow", "config", "--config", "/tmp/brieflow.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/brieflow.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = brieflow_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.pipeline.log_level, "info");
    }
}
