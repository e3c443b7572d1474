//! Command-line interface definitions for the GlowUp blog pipeline.
//!
//! Global options configure storage and the completion service; the
//! subcommand picks the trigger. Every global option can also come from an
//! environment variable.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::Category;

/// Command-line arguments for the GlowUp blog pipeline.
///
/// # Examples
///
/// ```sh
/// # Generate one article per category (cron entry point)
/// glowup_blog generate
///
/// # Generate a single beauty article into a custom data dir
/// glowup_blog --data-dir /srv/blog/data generate --category beauty
///
/// # Serve the trigger endpoints and start the hourly schedule
/// glowup_blog serve --bind 127.0.0.1:3000 --schedule
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "GLOWUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding `articles/` and `categories/`
    #[arg(long, env = "GLOWUP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for the daily log files
    #[arg(long, env = "GLOWUP_LOGS_DIR")]
    pub logs_dir: Option<PathBuf>,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Model name sent with each completion request
    #[arg(long, env = "OPENAI_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    /// Give up on a completion request after this many seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Generate articles now: one per category, or just `--category`
    Generate {
        #[arg(short = 'C', long, value_enum)]
        category: Option<Category>,
    },
    /// Serve the HTTP trigger endpoints
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "GLOWUP_BIND")]
        bind: Option<String>,

        /// Start the periodic schedule at boot
        #[arg(long)]
        schedule: bool,

        /// Seconds between scheduled runs
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Print the system health report as JSON
    Health {
        /// Include the most recent log lines
        #[arg(long)]
        include_logs: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_generate_all() {
        let cli = Cli::parse_from(["glowup_blog", "generate"]);
        assert_eq!(cli.command, Command::Generate { category: None });
    }

    #[test]
    fn test_cli_generate_single_category() {
        let cli = Cli::parse_from([
            "glowup_blog",
            "--data-dir",
            "/tmp/data",
            "generate",
            "--category",
            "wellness",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        assert_eq!(
            cli.command,
            Command::Generate {
                category: Some(Category::Wellness)
            }
        );
    }

    #[test]
    fn test_cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["glowup_blog", "generate", "-C", "gardening"]).is_err());
    }

    #[test]
    fn test_cli_serve_flags() {
        let cli = Cli::parse_from([
            "glowup_blog",
            "serve",
            "-b",
            "127.0.0.1:8080",
            "--schedule",
            "--interval-secs",
            "60",
        ]);
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: Some("127.0.0.1:8080".to_string()),
                schedule: true,
                interval_secs: Some(60),
            }
        );
    }
}
