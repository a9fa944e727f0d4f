//! Layered configuration for the taskboard client.
//!
//! Settings are read from `.taskboard/taskboard.toml` (or the per-user file
//! when the project has none), then overridden by environment variables,
//! then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:3141"
//! project_id = 1
//! token = "..."
//! request_timeout_ms = 10000
//! comment_delete_timeout_ms = 5000
//!
//! [board]
//! rollback = "reload"
//! orphans = "reassign"
//! retry_attempts = 1
//! retry_backoff_ms = 200
//!
//! [logging]
//! level = "info"
//! json = false
//! dir = ".taskboard/logs"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::mutator::{MutatorSettings, RollbackPolicy};
use crate::board::retry::RetryPolicy;
use crate::board::state::OrphanPolicy;

pub const CONFIG_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "taskboard.toml";

pub const ENV_URL: &str = "TASKBOARD_URL";
pub const ENV_PROJECT: &str = "TASKBOARD_PROJECT";
pub const ENV_TOKEN: &str = "TASKBOARD_TOKEN";

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_project_id")]
    pub project_id: i64,
    /// Bearer token attached to every request, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_comment_delete_timeout_ms")]
    pub comment_delete_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3141".to_string()
}

fn default_project_id() -> i64 {
    1
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_comment_delete_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: default_project_id(),
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
            comment_delete_timeout_ms: default_comment_delete_timeout_ms(),
        }
    }
}

/// Optimistic-update behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default)]
    pub rollback: RollbackPolicy,
    #[serde(default)]
    pub orphans: OrphanPolicy,
    /// Total persist attempts per move, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            rollback: RollbackPolicy::default(),
            orphans: OrphanPolicy::default(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rolled log files. Stderr only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

/// Root of taskboard.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskboardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TaskboardToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskboard.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize taskboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Human-readable warnings for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let url = self.server.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(format!(
                "server.base_url '{}' should start with http:// or https://",
                url
            ));
        }
        if self.server.project_id <= 0 {
            warnings.push(format!(
                "server.project_id {} is not a valid project id",
                self.server.project_id
            ));
        }
        if self.server.request_timeout_ms == 0 {
            warnings.push("server.request_timeout_ms is 0; requests will fail immediately".into());
        }
        if self.server.comment_delete_timeout_ms > self.server.request_timeout_ms {
            warnings.push(
                "server.comment_delete_timeout_ms exceeds request_timeout_ms and will never fire"
                    .into(),
            );
        }
        if self.board.retry_attempts == 0 {
            warnings.push("board.retry_attempts is 0; treated as 1".into());
        }
        if self.board.retry_attempts > 10 {
            warnings.push(format!(
                "board.retry_attempts {} is high; a failing move will hold its rollback for a long time",
                self.board.retry_attempts
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            warnings.push(format!(
                "logging.level '{}' is not a valid filter directive",
                self.logging.level
            ));
        }
        warnings
    }
}

/// Fully resolved backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub base_url: String,
    pub project_id: i64,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub comment_delete_timeout: Duration,
}

impl ServerSettings {
    /// Settings for a backend at `base_url` with default timeouts.
    pub fn for_url(base_url: impl Into<String>, project_id: i64) -> Self {
        let defaults = ServerSection::default();
        Self {
            base_url: base_url.into(),
            project_id,
            token: None,
            request_timeout: Duration::from_millis(defaults.request_timeout_ms),
            comment_delete_timeout: Duration::from_millis(defaults.comment_delete_timeout_ms),
        }
    }
}

/// Project configuration plus CLI overrides.
#[derive(Debug, Clone)]
pub struct TaskboardConfig {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: TaskboardToml,
    pub verbose: bool,
    pub cli_base_url: Option<String>,
    pub cli_project_id: Option<i64>,
}

impl TaskboardConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = match user_config_file() {
            Some(user) if !config_dir.join(CONFIG_FILE).exists() && user.exists() => {
                TaskboardToml::load(&user)?
            }
            _ => TaskboardToml::load_or_default(&config_dir)?,
        };
        Ok(Self {
            project_dir,
            config_dir,
            toml,
            verbose: false,
            cli_base_url: None,
            cli_project_id: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        base_url: Option<String>,
        project_id: Option<i64>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.cli_base_url = base_url;
        config.cli_project_id = project_id;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Server settings resolved as file → environment → CLI.
    pub fn server(&self) -> Result<ServerSettings> {
        self.server_with_env(|key| std::env::var(key).ok())
    }

    pub fn server_with_env<F>(&self, env: F) -> Result<ServerSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = &self.toml.server;
        let base_url = self
            .cli_base_url
            .clone()
            .or_else(|| env(ENV_URL))
            .unwrap_or_else(|| section.base_url.clone());
        let project_id = match (self.cli_project_id, env(ENV_PROJECT)) {
            (Some(id), _) => id,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer, got '{}'", ENV_PROJECT, raw))?,
            (None, None) => section.project_id,
        };
        let token = env(ENV_TOKEN).or_else(|| section.token.clone());

        Ok(ServerSettings {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            token,
            request_timeout: Duration::from_millis(section.request_timeout_ms),
            comment_delete_timeout: Duration::from_millis(section.comment_delete_timeout_ms),
        })
    }

    pub fn mutator_settings(&self) -> MutatorSettings {
        let board = &self.toml.board;
        MutatorSettings {
            rollback: board.rollback,
            orphans: board.orphans,
            retry: RetryPolicy::new(
                board.retry_attempts.max(1),
                Duration::from_millis(board.retry_backoff_ms),
            ),
        }
    }

    /// Log directory, resolved against the project directory when relative.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.toml.logging.dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.project_dir.join(dir)
            }
        })
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

/// Per-user fallback location (`~/.config/taskboard/taskboard.toml`).
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard").join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let config = TaskboardConfig::new(dir.path().to_path_buf()).unwrap();
        let server = config.server_with_env(no_env).unwrap();
        assert_eq!(server.base_url, "http://127.0.0.1:3141");
        assert_eq!(server.project_id, 1);
        assert_eq!(server.token, None);
        assert_eq!(server.comment_delete_timeout, Duration::from_secs(5));
        let settings = config.mutator_settings();
        assert_eq!(settings.rollback, RollbackPolicy::Reload);
        assert_eq!(settings.orphans, OrphanPolicy::Reassign);
        assert_eq!(settings.retry.max_attempts(), 1);
    }

    #[test]
    fn test_parse_full_file() {
        let toml = TaskboardToml::parse(
            r#"
            [server]
            base_url = "https://pm.example.com/"
            project_id = 42
            token = "secret"

            [board]
            rollback = "undo"
            orphans = "reject"
            retry_attempts = 3
            retry_backoff_ms = 50

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(toml.server.project_id, 42);
        assert_eq!(toml.board.rollback, RollbackPolicy::Undo);
        assert_eq!(toml.board.orphans, OrphanPolicy::Reject);
        assert!(toml.logging.json);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let result = TaskboardToml::parse("[board]\nrollback = \"retry\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_layering_file_env_cli() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join(CONFIG_FILE),
            "[server]\nbase_url = \"http://file:1\"\nproject_id = 3\ntoken = \"file-token\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [(ENV_URL, "http://env:2/"), (ENV_TOKEN, "env-token")]
            .into_iter()
            .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = TaskboardConfig::new(dir.path().to_path_buf()).unwrap();
        let server = config.server_with_env(lookup).unwrap();
        assert_eq!(server.base_url, "http://env:2");
        assert_eq!(server.project_id, 3);
        assert_eq!(server.token.as_deref(), Some("env-token"));

        let config = TaskboardConfig::with_cli_args(
            dir.path().to_path_buf(),
            false,
            Some("http://cli:3".into()),
            Some(9),
        )
        .unwrap();
        let server = config.server_with_env(lookup).unwrap();
        assert_eq!(server.base_url, "http://cli:3");
        assert_eq!(server.project_id, 9);
    }

    #[test]
    fn test_bad_project_env_is_error() {
        let dir = tempdir().unwrap();
        let config = TaskboardConfig::new(dir.path().to_path_buf()).unwrap();
        let result = config.server_with_env(|key| {
            (key == ENV_PROJECT).then(|| "abc".to_string())
        });
        assert!(result.unwrap_err().to_string().contains(ENV_PROJECT));
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut toml = TaskboardToml::default();
        toml.server.base_url = "localhost:3141".into();
        toml.server.project_id = 0;
        toml.board.retry_attempts = 0;
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("base_url"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = TaskboardToml::default();
        toml.board.retry_attempts = 4;
        toml.save(&path).unwrap();
        let loaded = TaskboardToml::load(&path).unwrap();
        assert_eq!(loaded.board.retry_attempts, 4);
        assert_eq!(loaded.server.base_url, toml.server.base_url);
    }

    #[test]
    fn test_relative_log_dir_resolves_against_project() {
        let dir = tempdir().unwrap();
        let mut config = TaskboardConfig::new(dir.path().to_path_buf()).unwrap();
        assert!(config.log_dir().is_none());
        config.toml.logging.dir = Some(PathBuf::from(".taskboard/logs"));
        assert_eq!(
            config.log_dir().unwrap(),
            config.project_dir.join(".taskboard/logs")
        );
    }
}
