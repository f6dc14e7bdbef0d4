//! Configuration file support for ghstats.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `GHSTATS_`, e.g., `GHSTATS_GITHUB_TOKEN`)
//! 2. Local config file (./ghstats.toml)
//! 3. XDG config file (~/.config/ghstats/config.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/ghstats/ghstats.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/ghstats/ghstats.db"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."  # or use GHSTATS_GITHUB_TOKEN env var
//! api_base = "https://api.github.com"  # or GHSTATS_GITHUB_API_BASE
//! log_api_calls = false  # or GHSTATS_GITHUB_LOG_API_CALLS
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/ghstats/ghstats.db` if not specified.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (personal access token).
    /// Can also be set via GHSTATS_GITHUB_TOKEN environment variable.
    pub token: Option<String>,
    /// API base URL, overridable for GitHub Enterprise.
    pub api_base: String,
    /// Record "api_call" meta interactions for detail fetches.
    pub log_api_calls: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
            log_api_calls: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/ghstats/config.toml)
    /// 3. Local config file (./ghstats.toml)
    /// 4. Environment variables with GHSTATS_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "ghstats") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("ghstats.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./ghstats.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., GHSTATS_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("GHSTATS")
                .separator("_")
                .try_parsing(true),
        );

        let config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        config.with_env_overrides()
    }

    /// Apply environment overrides for keys with underscores in their name.
    ///
    /// The single-underscore separator above cannot address fields like
    /// `github.api_base` (GHSTATS_GITHUB_API_BASE would split into
    /// `github.api.base`), so those are mapped explicitly here.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(api_base) = std::env::var("GHSTATS_GITHUB_API_BASE")
            && !api_base.is_empty()
        {
            self.github.api_base = api_base;
        }
        if let Ok(raw) = std::env::var("GHSTATS_GITHUB_LOG_API_CALLS") {
            match raw.parse::<bool>() {
                Ok(enabled) => self.github.log_api_calls = enabled,
                Err(_) => {
                    tracing::warn!("Ignoring non-boolean GHSTATS_GITHUB_LOG_API_CALLS={raw}");
                }
            }
        }
        self
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the
    /// file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("ghstats.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the GitHub token, or a user-facing error naming how to set one.
    pub fn github_token(&self) -> Result<String, Box<dyn std::error::Error>> {
        self.github
            .token
            .clone()
            .ok_or_else(|| "No GitHub token configured. Set GHSTATS_GITHUB_TOKEN or add it to the config file.".into())
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/ghstats` or `~/.local/state/ghstats`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ghstats").map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
