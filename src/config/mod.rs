//! Configuration management for RelayBot
//!
//! Configuration is loaded from `~/.relaybot/config.json` with environment
//! variable overrides. A missing file yields the defaults.

mod types;
pub mod validate;

pub use types::*;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RelayError, Result};
use validate::{validate_context_settings, DiagnosticLevel};

impl Config {
    /// Returns the RelayBot configuration directory path (~/.relaybot)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".relaybot")
    }

    /// Returns the path to the config file (~/.relaybot/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// Environment variables override config values using the pattern
    /// `RELAYBOT_SECTION_KEY`.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Values that fail to parse are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse().ok());

        // Context
        if let Some(v) = parsed("RELAYBOT_CONTEXT_MAX_CONTEXT_TOKENS") {
            self.context.max_context_tokens = v;
        }
        if let Some(v) = parsed("RELAYBOT_CONTEXT_ENFORCE_MAX_TURNS") {
            self.context.enforce_max_turns = v;
        }
        if let Some(v) = parsed("RELAYBOT_CONTEXT_TRUNCATE_TURNS") {
            self.context.truncate_turns = v;
        }
        if let Some(v) = lookup("RELAYBOT_CONTEXT_COMPRESSION_THRESHOLD")
            .and_then(|v| v.trim().parse::<f64>().ok())
        {
            self.context.compression_threshold = v;
        }
        if let Some(v) = lookup("RELAYBOT_CONTEXT_LLM_COMPRESS_KEEP_RECENT")
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.context.llm_compress_keep_recent = v;
        }

        // Logging
        if let Some(level) = lookup("RELAYBOT_LOGGING_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("RELAYBOT_LOGGING_FORMAT").and_then(|v| v.parse().ok()) {
            self.logging.format = format;
        }
    }

    /// Check semantic ranges; the first error becomes `RelayError::Config`.
    pub fn validate(&self) -> Result<()> {
        match validate_context_settings(&self.context)
            .into_iter()
            .find(|d| d.level == DiagnosticLevel::Error)
        {
            Some(diagnostic) => Err(RelayError::Config(diagnostic.to_string())),
            None => Ok(()),
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
