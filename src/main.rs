use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use proof_agent::cache::TokenCache;
use proof_agent::config::settings::{default_worker_count, GenerationSettings, ServerSettings, Settings};
use proof_agent::generation::GenerationCoordinator;
use proof_agent::producer::command::CommandProducerFactory;
use proof_agent::refresh::AutoRefreshLoop;
use proof_agent::server::server as http_server;
use proof_agent::server::AppState;
use proof_agent::session::HttpSessionFetcher;
use proof_agent::utils::logging::{self, LogLevel};
use reqwest::Client;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page fetched once per cycle to extract the session identifier from.
    #[arg(long, env = "SESSION_URL")]
    session_url: String,
    /// Regex with one capture group locating the session identifier.
    #[arg(long, env = "SESSION_PATTERN", default_value = r#""sessionId"\s*:\s*"([^"]+)""#)]
    session_pattern: String,
    /// Command deriving a proof; receives the session identifier as its last argument.
    #[arg(long, env = "PROOF_COMMAND")]
    proof_command: String,
    /// Extra arguments passed to the proof command, before the session identifier.
    #[arg(long = "proof-arg")]
    proof_args: Vec<String>,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "PORT", default_value_t = 4416)]
    port: u16,
    #[arg(long, env = "REFRESH_INTERVAL_MS", default_value_t = 30_000)]
    refresh_interval_ms: u64,
    #[arg(long, env = "RECOVERY_DELAY_MS", default_value_t = 5_000)]
    recovery_delay_ms: u64,
    #[arg(long, env = "GENERATION_DEADLINE_MS", default_value_t = 120_000)]
    generation_deadline_ms: u64,
    #[arg(long, env = "ATTEMPT_TIMEOUT_MS", default_value_t = 30_000)]
    attempt_timeout_ms: u64,
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value_t = 2_000)]
    retry_backoff_ms: u64,
    /// Workers per race; defaults to available cores minus one.
    #[arg(long, env = "WORKERS", default_value_t = default_worker_count())]
    workers: usize,
    /// Use the sequential bounded-retry strategy instead of the worker race.
    #[arg(long, env = "SEQUENTIAL")]
    sequential: bool,

    /// Run one sequential generation cycle, print the credentials and exit.
    #[arg(long)]
    one_shot: bool,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            server: ServerSettings {
                host: self.host.clone(),
                port: self.port,
            },
            generation: GenerationSettings {
                parallel: !self.sequential && !self.one_shot,
                worker_count: self.workers,
                overall_deadline: Duration::from_millis(self.generation_deadline_ms),
                max_attempts: self.max_attempts,
                attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
            recovery_delay: Duration::from_millis(self.recovery_delay_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level, &logging::LogFormat::from_env());

    let settings = args.settings();

    let client = Client::new();
    let fetcher = Arc::new(HttpSessionFetcher::new(
        client,
        args.session_url.clone(),
        &args.session_pattern,
    )?);
    let factory = Arc::new(CommandProducerFactory::new(
        args.proof_command.clone(),
        args.proof_args.clone(),
    ));
    let coordinator = Arc::new(GenerationCoordinator::new(
        fetcher,
        factory,
        settings.generation.clone(),
    ));

    if args.one_shot {
        let credentials = coordinator.generate().await?;
        println!("{}", serde_json::to_string_pretty(&credentials)?);
        return Ok(());
    }

    let cache = Arc::new(TokenCache::new(coordinator, settings.refresh_interval));
    let refresh_loop = AutoRefreshLoop::start(cache.clone(), settings.recovery_delay);

    let state = AppState::new(cache);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    };
    http_server::start(&settings.server, state, shutdown).await?;

    refresh_loop.stop().await;
    Ok(())
}
