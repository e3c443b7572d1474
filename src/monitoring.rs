//! Operator log book and health checks.
//!
//! [`LogBook`] appends one line per pipeline event to `logs/<YYYY-MM-DD>.log`
//! in the form `[<ISO timestamp>] [<LEVEL>] <message>`, and mirrors each
//! line to `tracing`. [`check_system_health`] inspects the data and log
//! directories.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument, warn};

use crate::store::ArticleStore;

/// Lines returned by the health endpoint when logs are requested.
pub const HEALTH_LOG_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        })
    }
}

/// Format one log book line (without the trailing newline).
pub fn format_line(at: DateTime<Utc>, level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        at.to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        message
    )
}

/// Append-only daily log files.
#[derive(Debug, Clone)]
pub struct LogBook {
    dir: PathBuf,
}

impl LogBook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, at: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!("{}.log", at.format("%Y-%m-%d")))
    }

    /// Record `message`. Failing to write the file is logged, never returned.
    pub async fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "logbook", "{message}"),
            LogLevel::Warning => warn!(target: "logbook", "{message}"),
            LogLevel::Error => error!(target: "logbook", "{message}"),
        }

        let now = Utc::now();
        let mut line = format_line(now, level, message);
        line.push('\n');
        if let Err(e) = self.append(now, &line).await {
            error!(dir = %self.dir.display(), error = %e, "Failed to write log book");
        }
    }

    pub async fn info(&self, message: &str) {
        self.log(LogLevel::Info, message).await
    }

    pub async fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message).await
    }

    pub async fn error(&self, message: &str) {
        self.log(LogLevel::Error, message).await
    }

    async fn append(&self, at: DateTime<Utc>, line: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(at))
            .await?;
        file.write_all(line.as_bytes()).await
    }

    /// The last `lines` non-empty lines of today's file.
    pub async fn recent(&self, lines: usize) -> Vec<String> {
        let path = self.file_for(Utc::now());
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let all: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
                let skip = all.len().saturating_sub(lines);
                all[skip..].iter().map(|l| l.to_string()).collect()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                vec!["No logs found for today".to_string()]
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read log book");
                vec!["Error reading log file".to_string()]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    fn from_issue_count(count: usize) -> Self {
        match count {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

/// Check the data directory, the articles directory (and that it holds at
/// least one file) and the log directory.
#[instrument(level = "info", skip_all)]
pub async fn check_system_health(store: &ArticleStore, log_book: &LogBook) -> HealthReport {
    let mut issues = Vec::new();

    if !is_dir(store.root()).await {
        issues.push("Data directory does not exist".to_string());
    }

    let articles_dir = store.articles_dir();
    if !is_dir(&articles_dir).await {
        issues.push("Articles directory does not exist".to_string());
    } else {
        let has_files = match fs::read_dir(&articles_dir).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
            Err(_) => false,
        };
        if !has_files {
            issues.push("No articles found".to_string());
        }
    }

    if !is_dir(log_book.dir()).await {
        issues.push("Log directory does not exist".to_string());
    }

    let report = HealthReport {
        status: HealthStatus::from_issue_count(issues.len()),
        issues,
    };
    info!(status = report.status.as_str(), issues = report.issues.len(), "Health check finished");
    report
}

/// Run a health check and record its outcome in the log book.
///
/// The check runs before anything is written, since writing creates the
/// log directory.
pub async fn run_health_check(store: &ArticleStore, log_book: &LogBook) -> HealthReport {
    let report = check_system_health(store, log_book).await;
    log_book
        .info(&format!("Health check status: {}", report.status.as_str()))
        .await;
    if !report.issues.is_empty() {
        let message = format!("Health check issues: {}", report.issues.join(", "));
        match report.status {
            HealthStatus::Unhealthy => log_book.error(&message).await,
            _ => log_book.warning(&message).await,
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let at = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        assert_eq!(
            format_line(at, LogLevel::Warning, "Health check issues: No articles found"),
            "[2025-05-06T14:30:00.000Z] [WARNING] Health check issues: No articles found"
        );
    }

    #[test]
    fn test_file_for_uses_date() {
        let book = LogBook::new("/var/log/glowup");
        let at = Utc.with_ymd_and_hms(2025, 5, 6, 23, 59, 0).unwrap();
        assert_eq!(book.file_for(at), PathBuf::from("/var/log/glowup/2025-05-06.log"));
    }

    #[tokio::test]
    async fn test_log_appends_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let book = LogBook::new(tmp.path().join("logs"));
        book.info("first").await;
        book.error("second").await;

        let content = std::fs::read_to_string(book.file_for(Utc::now())).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] [INFO] first"));
        assert!(lines[1].ends_with("] [ERROR] second"));
    }

    #[tokio::test]
    async fn test_recent_returns_tail() {
        let tmp = tempfile::tempdir().unwrap();
        let book = LogBook::new(tmp.path());
        assert_eq!(book.recent(10).await, ["No logs found for today"]);

        for n in 0..5 {
            book.info(&format!("event {n}")).await;
        }
        let recent = book.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert!(recent[0].ends_with("event 3"));
        assert!(recent[1].ends_with("event 4"));
    }

    #[tokio::test]
    async fn test_health_of_empty_workspace_is_unhealthy() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("data"));
        let book = LogBook::new(tmp.path().join("logs"));

        let report = check_system_health(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(
            report.issues,
            [
                "Data directory does not exist",
                "Articles directory does not exist",
                "Log directory does not exist",
            ]
        );
    }

    #[tokio::test]
    async fn test_health_degraded_with_no_articles() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("data"));
        let book = LogBook::new(tmp.path().join("logs"));
        std::fs::create_dir_all(store.articles_dir()).unwrap();
        std::fs::create_dir_all(book.dir()).unwrap();

        let report = check_system_health(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.issues, ["No articles found"]);

        std::fs::write(store.articles_dir().join("1.json"), "{}").unwrap();
        let report = check_system_health(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.issues.is_empty());
    }

    #[tokio::test]
    async fn test_run_health_check_writes_log_book() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("data"));
        let book = LogBook::new(tmp.path().join("logs"));

        let report = run_health_check(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.issues.iter().any(|i| i == "Log directory does not exist"));

        let lines = book.recent(10).await;
        assert!(lines[0].ends_with("[INFO] Health check status: unhealthy"));
        assert!(lines.iter().any(|l| l.contains("[ERROR] Health check issues:")));
        assert!(lines.iter().any(|l| l.contains("Log directory does not exist")));
    }

    #[tokio::test]
    async fn test_run_health_check_reports_missing_log_dir_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("data"));
        std::fs::create_dir_all(store.articles_dir()).unwrap();
        std::fs::write(store.articles_dir().join("1.json"), "{}").unwrap();
        let book = LogBook::new(tmp.path().join("logs"));

        let report = run_health_check(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.issues, ["Log directory does not exist"]);

        // The first run wrote the log book, so the directory now exists.
        let report = run_health_check(&store, &book).await;
        assert_eq!(report.status, HealthStatus::Healthy);
    }
}
