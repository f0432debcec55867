use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use disco_dive as lib;
use futures::future::join_all;
use lib::api::spotify::SpotifyCatalog;
use lib::cache::ResponseCache;
use lib::config::Config;
use lib::gate::ConcurrencyGate;
use lib::token::TokenContext;
use lib::worker::{JobOutcome, Worker, WorkerSettings};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::rolling::RollingFileAppender;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "disco-dive", version)]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a Disco Dive playlist for each seed playlist id (jobs run concurrently)
    Dive {
        /// Seed playlist ids
        #[arg(required = true)]
        playlist_ids: Vec<String>,

        /// Print job outcomes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Authorize against Spotify and store the access token (interactive)
    Auth,
    /// Validate config file and exit
    ConfigValidate,
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    // Explicit --config wins; otherwise the per-user file if present, else defaults.
    match explicit {
        Some(p) => Config::from_path(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => {
            let user_path = lib::config::default_config_path();
            if user_path.exists() {
                Config::from_path(&user_path)
                    .with_context(|| format!("loading config from {}", user_path.display()))
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn print_outcome(playlist_id: &str, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Succeeded(r) => {
            println!(
                "{}: created '{}' ({}) with {} tracks from {} artists",
                playlist_id,
                r.destination_playlist_name,
                r.destination_playlist_id,
                r.unique_track_count,
                r.artist_count
            );
            let partial = !r.skipped_artists.is_empty()
                || !r.skipped_albums.is_empty()
                || r.failed_batches() > 0;
            if partial {
                println!(
                    "  skipped {} artist(s), {} album(s); \
                     {} failed batch(es), {} track(s) not added",
                    r.skipped_artists.len(),
                    r.skipped_albums.len(),
                    r.failed_batches(),
                    r.dropped_uris.len()
                );
            }
        }
        JobOutcome::Failed { reason } => {
            eprintln!("{}: failed: {}", playlist_id, reason);
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    // Initialize log->tracing bridge and structured logging.
    // Logs go to both stdout and a daily-rotated file in cfg.log_dir.
    let _ = LogTracer::init();
    std::fs::create_dir_all(&cfg.log_dir)
        .with_context(|| format!("creating log dir {}", cfg.log_dir.display()))?;
    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&cfg.log_dir, "disco-dive.log");
    // `_guard` flushes the file writer on drop, so every exit path returns from main.
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Honor RUST_LOG if set, otherwise default to info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer().with_writer(non_blocking);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);

    tracing_subscriber_global::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")?;

    match cli.command {
        Commands::Dive { playlist_ids, json } => {
            let token = Arc::new(TokenContext::from_env_or_file(&cfg.token_path)?);
            if !token.is_present().await {
                anyhow::bail!(
                    "no access token: set {} or run `disco-dive auth`",
                    lib::token::ACCESS_TOKEN_ENV
                );
            }
            let catalog = Arc::new(SpotifyCatalog::from_config(&cfg, token)?);
            let worker = Worker::new(
                catalog,
                Arc::new(ResponseCache::new()),
                Arc::new(ConcurrencyGate::new(
                    cfg.max_concurrent_jobs,
                    cfg.admission_poll_interval(),
                )),
                WorkerSettings::from_config(&cfg),
            );

            let outcomes = join_all(playlist_ids.iter().map(|id| worker.start_job(id))).await;

            if json {
                let out: Vec<_> = playlist_ids.iter().zip(outcomes.iter()).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (id, outcome) in playlist_ids.iter().zip(outcomes.iter()) {
                    print_outcome(id, outcome);
                }
            }
            if outcomes.iter().any(|o| !o.is_success()) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Auth => {
            lib::api::spotify_auth::run_spotify_auth(&cfg).await?;
        }
        Commands::ConfigValidate => {
            // Defaults alone are always valid; only an explicit file can fail here.
            println!("OK");
        }
    }

    Ok(ExitCode::SUCCESS)
}
