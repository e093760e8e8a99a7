//! Configuration type definitions for RelayBot
//!
//! All types implement serde traits for JSON serialization and have sensible
//! defaults, so a partial (or missing) config file is always usable.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::compaction::{DEFAULT_COMPRESSION_THRESHOLD, DEFAULT_KEEP_RECENT};
use crate::agent::ContextConfig;

/// Main configuration struct for RelayBot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Context window management
    pub context: ContextSettings,
    /// Log output
    pub logging: LoggingConfig,
}

// ============================================================================
// Context Settings
// ============================================================================

/// Serializable context management settings.
///
/// Mirrors the plain-data part of [`ContextConfig`]; providers and custom
/// strategies are attached to the runtime config in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Token ceiling (`<= 0` disables token-based compression)
    pub max_context_tokens: i64,
    /// Turn cap (`-1` disables it)
    pub enforce_max_turns: i64,
    /// Turns dropped per truncation
    pub truncate_turns: i64,
    /// Usage ratio that triggers compression
    pub compression_threshold: f64,
    /// Custom summary instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_compress_instruction: Option<String>,
    /// Messages kept verbatim by summary compression
    pub llm_compress_keep_recent: usize,
    /// Bound on each summary call in seconds (0 = wait indefinitely)
    pub llm_compress_timeout_secs: u64,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_context_tokens: 0,
            enforce_max_turns: -1,
            truncate_turns: 1,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            llm_compress_instruction: None,
            llm_compress_keep_recent: DEFAULT_KEEP_RECENT,
            llm_compress_timeout_secs: 60,
        }
    }
}

impl ContextSettings {
    /// Build the runtime config. Collaborators (summary provider, custom
    /// counter or compressor) are attached afterwards with its builders.
    pub fn to_context_config(&self) -> ContextConfig {
        let timeout = match self.llm_compress_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut config = ContextConfig::new()
            .with_max_context_tokens(self.max_context_tokens)
            .with_enforce_max_turns(self.enforce_max_turns)
            .with_truncate_turns(self.truncate_turns)
            .with_compression_threshold(self.compression_threshold)
            .with_llm_compress_keep_recent(self.llm_compress_keep_recent)
            .with_llm_compress_timeout(timeout);
        if let Some(instruction) = &self.llm_compress_instruction {
            config = config.with_llm_compress_instruction(instruction);
        }
        config
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable tracing output
    Pretty,
    /// Compact single-line output with `component` fields
    #[default]
    Component,
    /// JSON lines for log aggregators
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "component" => Ok(Self::Component),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Append logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Component,
            file: None,
        }
    }
}
