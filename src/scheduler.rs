//! Pipeline runs and the periodic schedule.
//!
//! A pipeline run is topic selection → generation → slug/timestamp
//! assignment → save, for one category. [`Pipeline`] exposes it three ways:
//!
//! - [`Pipeline::run_for_category`]: one run, errors returned
//! - [`Pipeline::run_bulk`]: every category in [`Category::ALL`] order,
//!   stopping at the first error (earlier articles stay saved)
//! - [`Pipeline::run_random`]: one run for a uniformly random category
//!
//! [`Scheduler`] owns the background task that calls `run_random` on a fixed
//! interval. Tick failures are logged and the schedule carries on. Stopping
//! is cooperative: the task only checks for the stop signal while waiting
//! for the next tick, so a run in progress always completes its save. The
//! scheduler is created once by the composition root and shared with the
//! HTTP handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::generation::Generator;
use crate::models::{Article, Category};
use crate::monitoring::LogBook;
use crate::store::ArticleStore;
use crate::topics::{random_category, select_params};

/// Topic selector, generation client and store wired together.
pub struct Pipeline {
    generator: Generator,
    store: Arc<ArticleStore>,
    log_book: LogBook,
}

impl Pipeline {
    pub fn new(generator: Generator, store: Arc<ArticleStore>, log_book: LogBook) -> Self {
        Self {
            generator,
            store,
            log_book,
        }
    }

    pub fn store(&self) -> &Arc<ArticleStore> {
        &self.store
    }

    pub fn log_book(&self) -> &LogBook {
        &self.log_book
    }

    /// Generate and save one article for `category`.
    ///
    /// # Errors
    ///
    /// Only the save can fail; generation falls back to placeholder content.
    #[instrument(level = "info", skip(self))]
    pub async fn run_for_category(&self, category: Category) -> Result<Article> {
        let params = select_params(category, &mut rand::rng());
        let topic = params.topic.as_deref().unwrap_or(category.as_str());
        self.log_book
            .info(&format!("Generating article for {category}: {topic}"))
            .await;

        let generated = self.generator.generate(&params).await;
        let article = Article::from_generated(generated, category, Utc::now());

        match self.store.save(article).await {
            Ok(saved) => {
                self.log_book
                    .info(&format!(
                        "Successfully generated and saved article: {}",
                        saved.title
                    ))
                    .await;
                Ok(saved)
            }
            Err(e) => {
                self.log_book
                    .error(&format!("Error generating article for {category}: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// One article per category, sequentially, aborting on the first error.
    #[instrument(level = "info", skip(self))]
    pub async fn run_bulk(&self) -> Result<Vec<Article>> {
        self.log_book.info("Starting content generation for all categories").await;

        let mut saved = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            match self.run_for_category(category).await {
                Ok(article) => saved.push(article),
                Err(e) => {
                    self.log_book
                        .error(&format!("Error in content generation: {e}"))
                        .await;
                    return Err(e);
                }
            }
        }

        self.log_book
            .info(&format!(
                "Content generation completed successfully ({} articles)",
                saved.len()
            ))
            .await;
        Ok(saved)
    }

    /// One article for a uniformly random category.
    pub async fn run_random(&self) -> Result<Article> {
        let category = random_category(&mut rand::rng());
        self.run_for_category(category).await
    }
}

/// Whether [`Scheduler::start`] launched a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_secs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub completed_runs: u64,
    pub failed_runs: u64,
}

#[derive(Debug, Default)]
struct TickStats {
    completed: AtomicU64,
    failed: AtomicU64,
    last_run_at: RwLock<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default)]
struct Running {
    handle: Option<JoinHandle<()>>,
    stop_tx: Option<watch::Sender<bool>>,
    started_at: Option<DateTime<Utc>>,
}

/// Handle on the periodic generation task.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    period: Duration,
    running: Mutex<Running>,
    stats: Arc<TickStats>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, period: Duration) -> Self {
        Self {
            pipeline,
            period,
            running: Mutex::new(Running::default()),
            stats: Arc::new(TickStats::default()),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the periodic task unless it is already running. The first run
    /// happens one period after the start.
    pub async fn start(&self) -> StartOutcome {
        let mut running = self.running.lock().await;
        if running.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return StartOutcome::AlreadyRunning;
        }

        let pipeline = Arc::clone(&self.pipeline);
        let stats = Arc::clone(&self.stats);
        let period = self.period;
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                run_tick(&pipeline, &stats).await;
            }
        });

        running.handle = Some(handle);
        running.stop_tx = Some(stop_tx);
        running.started_at = Some(Utc::now());
        info!(period_secs = period.as_secs(), "Scheduled article generation started");
        StartOutcome::Started
    }

    /// Stop the periodic task. Returns whether one was running.
    ///
    /// A run already in progress is allowed to finish; this returns once the
    /// task has exited.
    pub async fn stop(&self) -> bool {
        let (handle, stop_tx) = {
            let mut running = self.running.lock().await;
            running.started_at = None;
            (running.handle.take(), running.stop_tx.take())
        };
        let Some(handle) = handle.filter(|h| !h.is_finished()) else {
            return false;
        };

        if let Some(stop_tx) = stop_tx {
            // A send error means the task already dropped its receiver.
            let _ = stop_tx.send(true);
        }
        if let Err(e) = handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        info!("Scheduled article generation stopped");
        true
    }

    pub async fn status(&self) -> SchedulerStatus {
        let running = self.running.lock().await;
        SchedulerStatus {
            running: running.handle.as_ref().is_some_and(|h| !h.is_finished()),
            interval_secs: self.period.as_secs(),
            started_at: running.started_at,
            last_run_at: *self.stats.last_run_at.read().await,
            completed_runs: self.stats.completed.load(Ordering::Relaxed),
            failed_runs: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

async fn run_tick(pipeline: &Pipeline, stats: &TickStats) {
    pipeline
        .log_book()
        .info("Running scheduled article generation...")
        .await;
    *stats.last_run_at.write().await = Some(Utc::now());

    match pipeline.run_random().await {
        Ok(article) => {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            pipeline
                .log_book()
                .info(&format!(
                    "Scheduled article generation completed successfully: {}",
                    article.title
                ))
                .await;
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "Scheduled run failed; waiting for next tick");
            pipeline
                .log_book()
                .error(&format!("Error in scheduled article generation: {e}"))
                .await;
        }
    }
}
