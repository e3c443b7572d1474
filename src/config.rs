//! Runtime settings.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional YAML file, and command-line flags (which clap also
//! fills from environment variables). See [`Settings::resolve`].
//!
//! ```yaml
//! data_dir: /var/lib/glowup/data
//! logs_dir: /var/log/glowup
//! bind: 0.0.0.0:3000
//! schedule_interval_secs: 3600
//! openai:
//!   model: gpt-4
//!   base_url: https://api.openai.com/v1/
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cli::Cli;
use crate::error::Result;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEDULE_INTERVAL_SECS: u64 = 60 * 60;

/// Connection settings for the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// No timeout unless set.
    pub request_timeout_secs: Option<u64>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub bind: String,
    pub schedule_interval_secs: u64,
    pub openai: OpenAiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            bind: DEFAULT_BIND.to_string(),
            schedule_interval_secs: DEFAULT_SCHEDULE_INTERVAL_SECS,
            openai: OpenAiSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a YAML file. Missing keys keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_yaml::from_str(&raw)?;
        debug!(data_dir = %settings.data_dir.display(), model = %settings.openai.model, "Loaded settings file");
        Ok(settings)
    }

    /// Defaults, then the `--config` file if one was given, then flags.
    pub async fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        Ok(settings)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(dir) = &cli.logs_dir {
            self.logs_dir = dir.clone();
        }
        if let Some(key) = &cli.openai_api_key {
            self.openai.api_key = Some(key.clone());
        }
        if let Some(model) = &cli.model {
            self.openai.model = model.clone();
        }
        if let Some(base) = &cli.api_base {
            self.openai.base_url = base.clone();
        }
        if let Some(secs) = cli.request_timeout_secs {
            self.openai.request_timeout_secs = Some(secs);
        }
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "data_dir: /srv/blog/data\nopenai:\n  model: gpt-4o-mini\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/blog/data"));
        assert_eq!(settings.logs_dir, PathBuf::from("logs"));
        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.schedule_interval_secs, 3600);
    }

    #[tokio::test]
    async fn test_cli_overrides_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("glowup.yaml");
        std::fs::write(&path, "data_dir: /from/file\nlogs_dir: /file/logs\n").unwrap();

        let cli = Cli::parse_from([
            "glowup_blog",
            "--config",
            path.to_str().unwrap(),
            "--data-dir",
            "/from/cli",
            "--model",
            "gpt-4o",
            "health",
        ]);
        let settings = Settings::resolve(&cli).await.unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/from/cli"));
        assert_eq!(settings.logs_dir, PathBuf::from("/file/logs"));
        assert_eq!(settings.openai.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["glowup_blog", "--config", "/nonexistent/glowup.yaml", "health"]);
        assert!(Settings::resolve(&cli).await.is_err());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-secret".to_string());
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }
}
