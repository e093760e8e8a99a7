//! Runtime configuration for [`ContextManager`](super::ContextManager).

use std::sync::Arc;
use std::time::Duration;

use crate::providers::LLMProvider;

use super::compaction::{ContextCompressor, DEFAULT_COMPRESSION_THRESHOLD, DEFAULT_KEEP_RECENT};
use super::token_counter::TokenCounter;

/// Default bound on a single summary call.
pub const DEFAULT_LLM_COMPRESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Context management settings.
///
/// Unlike [`ContextSettings`](crate::config::ContextSettings), which is the
/// serializable file/env form, this struct carries live collaborators
/// (providers, custom counters and compressors).
#[derive(Clone)]
pub struct ContextConfig {
    /// Token ceiling. `<= 0` disables token-based compression.
    pub max_context_tokens: i64,
    /// Maximum turns kept before compression. `-1` means no cap.
    pub enforce_max_turns: i64,
    /// Turns dropped per truncation.
    pub truncate_turns: i64,
    /// Usage ratio that triggers compression.
    pub compression_threshold: f64,
    /// Summary instruction; `None` uses the built-in one.
    pub llm_compress_instruction: Option<String>,
    /// Messages kept verbatim by the summary compressor.
    pub llm_compress_keep_recent: usize,
    /// Provider for summary compression. `None` selects truncation.
    pub llm_compress_provider: Option<Arc<dyn LLMProvider>>,
    /// Bound on each summary call. `None` waits indefinitely.
    pub llm_compress_timeout: Option<Duration>,
    pub custom_token_counter: Option<Arc<dyn TokenCounter>>,
    /// Takes precedence over both built-in compressors.
    pub custom_compressor: Option<Arc<dyn ContextCompressor>>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 0,
            enforce_max_turns: -1,
            truncate_turns: 1,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            llm_compress_instruction: None,
            llm_compress_keep_recent: DEFAULT_KEEP_RECENT,
            llm_compress_provider: None,
            llm_compress_timeout: Some(DEFAULT_LLM_COMPRESS_TIMEOUT),
            custom_token_counter: None,
            custom_compressor: None,
        }
    }
}

impl std::fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextConfig")
            .field("max_context_tokens", &self.max_context_tokens)
            .field("enforce_max_turns", &self.enforce_max_turns)
            .field("truncate_turns", &self.truncate_turns)
            .field("compression_threshold", &self.compression_threshold)
            .field("llm_compress_instruction", &self.llm_compress_instruction)
            .field("llm_compress_keep_recent", &self.llm_compress_keep_recent)
            .field(
                "llm_compress_provider",
                &self.llm_compress_provider.as_ref().map(|p| p.name()),
            )
            .field("llm_compress_timeout", &self.llm_compress_timeout)
            .field(
                "custom_token_counter",
                &self.custom_token_counter.is_some(),
            )
            .field(
                "custom_compressor",
                &self.custom_compressor.as_ref().map(|c| c.name()),
            )
            .finish()
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_context_tokens(mut self, max_context_tokens: i64) -> Self {
        self.max_context_tokens = max_context_tokens;
        self
    }

    pub fn with_enforce_max_turns(mut self, enforce_max_turns: i64) -> Self {
        self.enforce_max_turns = enforce_max_turns;
        self
    }

    pub fn with_truncate_turns(mut self, truncate_turns: i64) -> Self {
        self.truncate_turns = truncate_turns;
        self
    }

    pub fn with_compression_threshold(mut self, threshold: f64) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn with_llm_compress_instruction(mut self, instruction: &str) -> Self {
        self.llm_compress_instruction = Some(instruction.to_string());
        self
    }

    pub fn with_llm_compress_keep_recent(mut self, keep_recent: usize) -> Self {
        self.llm_compress_keep_recent = keep_recent;
        self
    }

    /// Enable summary compression through `provider`.
    pub fn with_llm_compress_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.llm_compress_provider = Some(provider);
        self
    }

    pub fn with_llm_compress_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.llm_compress_timeout = timeout;
        self
    }

    pub fn with_custom_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.custom_token_counter = Some(counter);
        self
    }

    pub fn with_custom_compressor(mut self, compressor: Arc<dyn ContextCompressor>) -> Self {
        self.custom_compressor = Some(compressor);
        self
    }
}
