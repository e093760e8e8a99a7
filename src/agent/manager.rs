//! Per-turn context pipeline.
//!
//! [`ContextManager::process`] runs three phases in order:
//!
//! 1. **Turn cap**: with `enforce_max_turns != -1` the history is capped via
//!    [`truncate_by_turns`].
//! 2. **Token budget**: with `max_context_tokens > 0` the history is counted
//!    and handed to the configured compressor when it crosses the threshold.
//! 3. **Fallback**: if the compressed history is still over the threshold it
//!    is halved once with [`truncate_by_halving`]. There is no second retry.
//!
//! Any error or panic inside the pipeline is logged and the original input is
//! returned, so a context failure never fails the chat turn.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, Instrument, Span};

use crate::error::Result;
use crate::providers::{LLMProvider, TimeoutProvider};
use crate::session::Message;

use super::compaction::{ContextCompressor, LLMSummaryCompressor, TruncateByTurnsCompressor};
use super::config::ContextConfig;
use super::token_counter::{EstimateTokenCounter, TokenCounter};
use super::truncator::{truncate_by_halving, truncate_by_turns};

/// Orchestrates turn capping and token-budget compression.
///
/// Holds immutable configuration only, so one instance can serve any number
/// of concurrent conversations.
///
/// # Example
///
/// ```rust,ignore
/// use relaybot::agent::{ContextConfig, ContextManager};
///
/// let manager = ContextManager::new(
///     ContextConfig::new().with_max_context_tokens(8000).with_enforce_max_turns(20),
/// );
/// let to_send = manager.process(history, last_usage.total_tokens as u64).await;
/// ```
pub struct ContextManager {
    config: ContextConfig,
    token_counter: Arc<dyn TokenCounter>,
    compressor: Arc<dyn ContextCompressor>,
    span: Span,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("config", &self.config)
            .field("compressor", &self.compressor.name())
            .finish()
    }
}

impl ContextManager {
    /// Build a manager from `config`.
    ///
    /// Compressor selection: `custom_compressor` if set, otherwise the LLM
    /// summary compressor when `llm_compress_provider` is set, otherwise the
    /// turn-drop compressor.
    pub fn new(config: ContextConfig) -> Self {
        let token_counter = config
            .custom_token_counter
            .clone()
            .unwrap_or_else(|| Arc::new(EstimateTokenCounter));
        let compressor = select_compressor(&config);

        debug!(
            component = "context",
            compressor = compressor.name(),
            max_context_tokens = config.max_context_tokens,
            enforce_max_turns = config.enforce_max_turns,
            "Context manager initialized"
        );

        Self {
            config,
            token_counter,
            compressor,
            span: tracing::info_span!("context_manager"),
        }
    }

    /// Instrument every `process` call with `span` instead of the default
    /// `context_manager` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Name of the selected compressor.
    pub fn compressor_name(&self) -> &str {
        self.compressor.name()
    }

    /// Count tokens with the configured counter.
    pub fn count_tokens(&self, messages: &[Message], trusted_token_usage: u64) -> u64 {
        self.token_counter.count_tokens(messages, trusted_token_usage)
    }

    /// Process a history before it is sent to the model.
    ///
    /// Never fails: on any error or panic the original `messages` come back
    /// unchanged.
    ///
    /// # Arguments
    /// * `messages` - The full candidate history for this turn
    /// * `trusted_token_usage` - Token total the API reported for this
    ///   context, or 0 when unknown
    pub async fn process(&self, messages: Vec<Message>, trusted_token_usage: u64) -> Vec<Message> {
        async move {
            let original = messages.clone();
            let outcome = AssertUnwindSafe(self.try_process(messages, trusted_token_usage))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(processed)) => processed,
                Ok(Err(e)) => {
                    error!(component = "context", error = %e, "Error during context processing");
                    original
                }
                Err(payload) => {
                    error!(
                        component = "context",
                        panic = panic_message(payload.as_ref()),
                        "Panic during context processing"
                    );
                    original
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Run the pipeline and surface errors instead of containing them.
    pub async fn try_process(
        &self,
        messages: Vec<Message>,
        trusted_token_usage: u64,
    ) -> Result<Vec<Message>> {
        let mut result = messages;

        if self.config.enforce_max_turns != -1 {
            result = truncate_by_turns(
                result,
                self.config.enforce_max_turns,
                self.config.truncate_turns,
            );
        }

        if self.config.max_context_tokens > 0 {
            let total_tokens = self.token_counter.count_tokens(&result, trusted_token_usage);
            if self
                .compressor
                .should_compress(&result, total_tokens, self.config.max_context_tokens)
            {
                result = self.run_compression(result, total_tokens).await?;
            }
        }

        Ok(result)
    }

    async fn run_compression(&self, messages: Vec<Message>, prev_tokens: u64) -> Result<Vec<Message>> {
        let max_tokens = self.config.max_context_tokens;
        debug!(
            component = "context",
            compressor = self.compressor.name(),
            tokens = prev_tokens,
            max_tokens,
            "Compressing context"
        );

        let compressed = self.compressor.compress(messages).await?;
        let tokens_after = self.token_counter.count_tokens(&compressed, 0);

        let rate = if max_tokens > 0 {
            tokens_after as f64 / max_tokens as f64 * 100.0
        } else {
            0.0
        };
        info!(
            component = "context",
            compressor = self.compressor.name(),
            tokens_before = prev_tokens,
            tokens_after,
            rate = %format!("{:.1}%", rate),
            "Context compressed"
        );

        if self
            .compressor
            .should_compress(&compressed, tokens_after, max_tokens)
        {
            info!(
                component = "context",
                tokens = tokens_after,
                max_tokens,
                "Context still over threshold after compression, halving"
            );
            return Ok(truncate_by_halving(compressed));
        }

        Ok(compressed)
    }
}

fn select_compressor(config: &ContextConfig) -> Arc<dyn ContextCompressor> {
    if let Some(custom) = &config.custom_compressor {
        return custom.clone();
    }

    if let Some(provider) = &config.llm_compress_provider {
        let provider: Arc<dyn LLMProvider> = match config.llm_compress_timeout {
            Some(timeout) => Arc::new(TimeoutProvider::new(provider.clone(), timeout)),
            None => provider.clone(),
        };
        let mut compressor = LLMSummaryCompressor::new(provider)
            .with_keep_recent(config.llm_compress_keep_recent)
            .with_threshold(config.compression_threshold);
        if let Some(instruction) = &config.llm_compress_instruction {
            compressor = compressor.with_instruction(instruction);
        }
        return Arc::new(compressor);
    }

    Arc::new(
        TruncateByTurnsCompressor::new(config.truncate_turns)
            .with_threshold(config.compression_threshold),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
