//! Command-line entry point.
//!
//! ```sh
//! glowup_blog generate                      # one article per category, then exit
//! glowup_blog generate --category beauty    # a single article
//! glowup_blog serve --schedule              # trigger endpoints + hourly schedule
//! glowup_blog health --include-logs         # JSON health report
//! ```

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use glowup_blog::api::OpenAiClient;
use glowup_blog::cli::{Cli, Command};
use glowup_blog::config::Settings;
use glowup_blog::generation::Generator;
use glowup_blog::http::{AppState, run_server};
use glowup_blog::monitoring::{HEALTH_LOG_LINES, LogBook, run_health_check};
use glowup_blog::scheduler::{Pipeline, Scheduler};
use glowup_blog::store::ArticleStore;
use glowup_blog::utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "glowup_blog failed");
            ExitCode::FAILURE
        }
    }
}

#[instrument(skip_all)]
async fn run(args: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    let settings = Settings::resolve(&args).await?;
    info!(
        data_dir = %settings.data_dir.display(),
        logs_dir = %settings.logs_dir.display(),
        model = %settings.openai.model,
        "Loaded settings"
    );
    if settings.openai.api_key.is_none() {
        warn!("No API key configured; generation will fall back to placeholder articles");
    }

    let store = Arc::new(ArticleStore::new(&settings.data_dir));
    let log_book = LogBook::new(&settings.logs_dir);

    let code = match args.command {
        Command::Health { include_logs } => {
            let report = run_health_check(&store, &log_book).await;
            let mut body = json!({
                "timestamp": chrono::Utc::now(),
                "status": report.status,
                "issues": report.issues,
            });
            if include_logs {
                body["logs"] = json!(log_book.recent(HEALTH_LOG_LINES).await);
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
            ExitCode::SUCCESS
        }
        Command::Generate { category } => {
            ensure_writable_dir(&settings.data_dir).await?;
            let pipeline = build_pipeline(&settings, store, log_book)?;
            let result = match category {
                Some(category) => pipeline.run_for_category(category).await.map(|a| vec![a]),
                None => pipeline.run_bulk().await,
            };
            match result {
                Ok(saved) => {
                    for article in &saved {
                        info!(id = ?article.id, slug = %article.slug, category = %article.category, "Article ready");
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "Content generation failed");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Serve {
            bind,
            schedule,
            interval_secs,
        } => {
            ensure_writable_dir(&settings.data_dir).await?;
            ensure_writable_dir(&settings.logs_dir).await?;

            let pipeline = Arc::new(build_pipeline(&settings, store, log_book)?);
            let period = interval_secs
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| settings.schedule_interval());
            let scheduler = Arc::new(Scheduler::new(Arc::clone(&pipeline), period));
            if schedule {
                scheduler.start().await;
            }

            let addr = bind.unwrap_or_else(|| settings.bind.clone());
            run_server(AppState::new(pipeline, scheduler), &addr).await?;
            ExitCode::SUCCESS
        }
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(code)
}

fn build_pipeline(
    settings: &Settings,
    store: Arc<ArticleStore>,
    log_book: LogBook,
) -> glowup_blog::Result<Pipeline> {
    let client = OpenAiClient::new(&settings.openai)?;
    info!(endpoint = %client.endpoint(), "Completion client ready");
    Ok(Pipeline::new(Generator::new(Arc::new(client)), store, log_book))
}
