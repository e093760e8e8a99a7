//! Context compression strategies for conversation history.
//!
//! A [`ContextCompressor`] decides when a history is too close to the token
//! ceiling and produces a smaller one. Two strategies ship with the crate:
//!
//! - **Truncate by turns** ([`TruncateByTurnsCompressor`]): drop the oldest
//!   turns. Local and deterministic.
//! - **LLM summary** ([`LLMSummaryCompressor`]): replace older messages with
//!   a model-written summary, keeping the most recent messages verbatim.
//!   Falls back to the untouched history when the summary call fails.
//!
//! Custom strategies implement the trait and are handed to
//! [`ContextConfig::with_custom_compressor`](super::ContextConfig::with_custom_compressor).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::Result;
use crate::providers::LLMProvider;
use crate::session::{Message, Role};

use super::truncator::{system_prefix_len, truncate_by_dropping_oldest_turns};

/// Usage ratio above which compression triggers. Leaves headroom below the
/// hard ceiling because the token figure may lag one turn behind.
pub const DEFAULT_COMPRESSION_THRESHOLD: f64 = 0.82;

/// Messages kept verbatim by the summary compressor.
pub const DEFAULT_KEEP_RECENT: usize = 4;

/// Instruction appended to the history sent for summarization.
pub const DEFAULT_SUMMARY_INSTRUCTION: &str = "Based on our full conversation history, produce a concise summary of key takeaways and/or project progress.\n\
1. Systematically cover all core topics discussed and the final conclusion/outcome for each; clearly highlight the latest primary focus.\n\
2. If any tools were used, summarize tool usage (total call count) and extract the most valuable insights from tool outputs.\n\
3. If there was an initial user goal, state it first and describe the current progress/status.\n\
4. Write the summary in the user's language.\n";

const SUMMARY_PREFIX: &str = "Our previous history conversation summary: ";
const SUMMARY_ACKNOWLEDGEMENT: &str =
    "Acknowledged the summary of our previous conversation history.";

/// Whether `current_tokens` uses more than `threshold` of `max_tokens`.
///
/// Always `false` for a non-positive ceiling or a zero count.
///
/// # Examples
/// ```
/// use relaybot::agent::compaction::exceeds_threshold;
///
/// assert!(exceeds_threshold(900, 1000, 0.82));
/// assert!(!exceeds_threshold(100, 1000, 0.82));
/// assert!(!exceeds_threshold(900, 0, 0.82));
/// ```
pub fn exceeds_threshold(current_tokens: u64, max_tokens: i64, threshold: f64) -> bool {
    if max_tokens <= 0 || current_tokens == 0 {
        return false;
    }
    current_tokens as f64 / max_tokens as f64 > threshold
}

/// A strategy for shrinking a message history below a token budget.
///
/// One compressor instance serves every conversation of a manager, so
/// implementations must be reentrant.
#[async_trait]
pub trait ContextCompressor: Send + Sync {
    /// Strategy name, used in logs.
    fn name(&self) -> &str;

    /// Usage ratio above which [`should_compress`](Self::should_compress) fires.
    fn threshold(&self) -> f64 {
        DEFAULT_COMPRESSION_THRESHOLD
    }

    /// Check if compression is needed.
    ///
    /// # Arguments
    /// * `messages` - The history being evaluated
    /// * `current_tokens` - Its token count
    /// * `max_tokens` - The token ceiling (`<= 0` means unlimited)
    fn should_compress(&self, _messages: &[Message], current_tokens: u64, max_tokens: i64) -> bool {
        exceeds_threshold(current_tokens, max_tokens, self.threshold())
    }

    /// Produce the compressed history.
    async fn compress(&self, messages: Vec<Message>) -> Result<Vec<Message>>;
}

// ============================================================================
// Truncate by turns
// ============================================================================

/// Compressor that drops the oldest turns.
#[derive(Debug, Clone)]
pub struct TruncateByTurnsCompressor {
    truncate_turns: i64,
    compression_threshold: f64,
}

impl TruncateByTurnsCompressor {
    /// Create a compressor dropping `truncate_turns` turns per compression.
    pub fn new(truncate_turns: i64) -> Self {
        Self {
            truncate_turns,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }

    /// Override the trigger threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn truncate_turns(&self) -> i64 {
        self.truncate_turns
    }
}

impl Default for TruncateByTurnsCompressor {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl ContextCompressor for TruncateByTurnsCompressor {
    fn name(&self) -> &str {
        "truncate_by_turns"
    }

    fn threshold(&self) -> f64 {
        self.compression_threshold
    }

    async fn compress(&self, messages: Vec<Message>) -> Result<Vec<Message>> {
        Ok(truncate_by_dropping_oldest_turns(
            messages,
            self.truncate_turns,
        ))
    }
}

// ============================================================================
// LLM summary
// ============================================================================

/// Split a history into `(system_prefix, to_summarize, recent)`.
///
/// `recent` holds roughly the last `keep_recent` non-system messages. The
/// split point is moved backward until `recent` starts with a user message,
/// so the kept window begins with a whole turn. When no user message is
/// found on the way back, nothing is summarized and the whole non-system
/// part is `recent`. A split point right at the end (`keep_recent == 0`) is
/// accepted as is: everything gets summarized.
///
/// # Examples
/// ```
/// use relaybot::session::Message;
/// use relaybot::agent::compaction::split_history;
///
/// let msgs = vec![
///     Message::system("You are helpful."),
///     Message::user("Tell me about Rust"),
///     Message::assistant("Rust is a systems language..."),
///     Message::user("What about async?"),
///     Message::assistant("Async in Rust uses tokio..."),
/// ];
/// let (system, old, recent) = split_history(&msgs, 2);
/// assert_eq!((system.len(), old.len(), recent.len()), (1, 2, 2));
/// ```
pub fn split_history(
    messages: &[Message],
    keep_recent: usize,
) -> (&[Message], &[Message], &[Message]) {
    let (system, rest) = messages.split_at(system_prefix_len(messages));

    if rest.len() <= keep_recent {
        return (system, &[], rest);
    }

    let mut split_index = rest.len() - keep_recent;
    while split_index > 0 && split_index < rest.len() && rest[split_index].role != Role::User {
        split_index -= 1;
    }

    if split_index == 0 {
        return (system, &[], rest);
    }

    let (to_summarize, recent) = rest.split_at(split_index);
    (system, to_summarize, recent)
}

/// Compressor that asks an LLM to summarize older history.
///
/// Output shape: `[system prefix.., user(summary), assistant(ack), recent..]`.
/// The synthetic acknowledgment keeps user/assistant alternation intact.
#[derive(Clone)]
pub struct LLMSummaryCompressor {
    provider: Arc<dyn LLMProvider>,
    keep_recent: usize,
    instruction: String,
    compression_threshold: f64,
}

impl std::fmt::Debug for LLMSummaryCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMSummaryCompressor")
            .field("provider", &self.provider.name())
            .field("keep_recent", &self.keep_recent)
            .field("compression_threshold", &self.compression_threshold)
            .finish()
    }
}

impl LLMSummaryCompressor {
    /// Create a summary compressor with default settings:
    /// - `keep_recent`: 4
    /// - `instruction`: [`DEFAULT_SUMMARY_INSTRUCTION`]
    /// - `compression_threshold`: 0.82
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            keep_recent: DEFAULT_KEEP_RECENT,
            instruction: DEFAULT_SUMMARY_INSTRUCTION.to_string(),
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }

    /// Number of most recent messages kept verbatim.
    pub fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }

    /// Replace the summary instruction.
    pub fn with_instruction(mut self, instruction: &str) -> Self {
        self.instruction = instruction.to_string();
        self
    }

    /// Override the trigger threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn keep_recent(&self) -> usize {
        self.keep_recent
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

#[async_trait]
impl ContextCompressor for LLMSummaryCompressor {
    fn name(&self) -> &str {
        "llm_summary"
    }

    fn threshold(&self) -> f64 {
        self.compression_threshold
    }

    async fn compress(&self, messages: Vec<Message>) -> Result<Vec<Message>> {
        if messages.len() <= self.keep_recent + 1 {
            return Ok(messages);
        }

        let (system, to_summarize, recent) = split_history(&messages, self.keep_recent);
        if to_summarize.is_empty() {
            debug!(
                component = "context",
                "No complete turn boundary found, skipping summary"
            );
            return Ok(messages);
        }

        let mut payload = Vec::with_capacity(to_summarize.len() + 1);
        payload.extend_from_slice(to_summarize);
        payload.push(Message::user(&self.instruction));

        let summary = match self.provider.text_chat(payload, None).await {
            Ok(response) if !response.completion_text.trim().is_empty() => {
                response.completion_text
            }
            Ok(_) => {
                error!(
                    component = "context",
                    provider = self.provider.name(),
                    "Failed to generate summary: empty completion"
                );
                return Ok(messages);
            }
            Err(e) => {
                error!(
                    component = "context",
                    provider = self.provider.name(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to generate summary"
                );
                return Ok(messages);
            }
        };

        let mut result = Vec::with_capacity(system.len() + 2 + recent.len());
        result.extend_from_slice(system);
        result.push(Message::user(&format!("{}{}", SUMMARY_PREFIX, summary)));
        result.push(Message::assistant(SUMMARY_ACKNOWLEDGEMENT));
        result.extend_from_slice(recent);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::token_counter::{EstimateTokenCounter, TokenCounter};
    use crate::error::{ProviderError, RelayError};
    use crate::providers::{ChatOptions, LLMResponse, ToolDefinition};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns a fixed summary and records every payload it receives.
    struct SummaryProvider {
        reply: &'static str,
        calls: AtomicUsize,
        last_payload: Mutex<Vec<Message>>,
    }

    impl SummaryProvider {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_payload: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for SummaryProvider {
        async fn chat(
            &self,
            messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_payload.lock().unwrap() = messages;
            Ok(LLMResponse::text(self.reply))
        }

        fn default_model(&self) -> &str {
            "summary-model"
        }

        fn name(&self) -> &str {
            "summary"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl LLMProvider for FailingProvider {
        async fn chat(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            Err(RelayError::ProviderTyped(ProviderError::ServerError(
                "503 upstream unavailable".into(),
            )))
        }

        fn default_model(&self) -> &str {
            "none"
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn conversation(turns: usize) -> Vec<Message> {
        let mut msgs = vec![Message::system("You are helpful.")];
        for i in 0..turns {
            msgs.push(Message::user(&format!("question {}", i)));
            msgs.push(Message::assistant(&format!("answer {}", i)));
        }
        msgs
    }

    // ── should_compress ────────────────────────────────────────────────

    #[test]
    fn test_should_compress_threshold() {
        let c = TruncateByTurnsCompressor::new(1);
        assert!(!c.should_compress(&[], 820, 1000));
        assert!(c.should_compress(&[], 821, 1000));
        assert!(!c.should_compress(&[], 100, 1000));
    }

    #[test]
    fn test_should_compress_disabled_limits() {
        let c = TruncateByTurnsCompressor::new(1);
        assert!(!c.should_compress(&[], 5000, 0));
        assert!(!c.should_compress(&[], 5000, -1));
        assert!(!c.should_compress(&[], 0, 1000));
    }

    #[test]
    fn test_custom_threshold() {
        let c = TruncateByTurnsCompressor::new(1).with_threshold(0.5);
        assert!(c.should_compress(&[], 600, 1000));
        let s = LLMSummaryCompressor::new(SummaryProvider::new("x")).with_threshold(0.95);
        assert!(!s.should_compress(&[], 900, 1000));
    }

    // ── TruncateByTurnsCompressor ──────────────────────────────────────

    #[tokio::test]
    async fn test_truncate_compressor_drops_configured_turns() {
        let compressor = TruncateByTurnsCompressor::new(2);
        let result = compressor.compress(conversation(5)).await.unwrap();
        // system + 3 remaining turns
        assert_eq!(result.len(), 7);
        assert_eq!(result[0].role, Role::System);
        assert_eq!(result[1], Message::user("question 2"));
    }

    #[test]
    fn test_truncate_compressor_reduces_tokens() {
        let msgs = conversation(6);
        let before = EstimateTokenCounter.count_tokens(&msgs, 0);
        let result = tokio_test::block_on(TruncateByTurnsCompressor::new(1).compress(msgs)).unwrap();
        let after = EstimateTokenCounter.count_tokens(&result, 0);
        assert!(after < before);
    }

    // ── split_history ──────────────────────────────────────────────────

    #[test]
    fn test_split_nothing_to_summarize() {
        let msgs = conversation(1);
        let (system, old, recent) = split_history(&msgs, 4);
        assert_eq!(system.len(), 1);
        assert!(old.is_empty());
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_split_moves_back_to_user() {
        let msgs = conversation(4);
        // naive split would land on an assistant message
        let (_, old, recent) = split_history(&msgs, 3);
        assert_eq!(old.len(), 4);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].role, Role::User);
    }

    #[test]
    fn test_split_without_user_boundary_keeps_everything() {
        let msgs = vec![
            Message::user("start"),
            Message::assistant("a1"),
            Message::assistant("a2"),
            Message::assistant("a3"),
            Message::assistant("a4"),
        ];
        let (system, old, recent) = split_history(&msgs, 2);
        assert!(system.is_empty());
        assert!(old.is_empty());
        assert_eq!(recent.len(), 5);
    }

    #[test]
    fn test_split_keep_zero_summarizes_everything() {
        let msgs = conversation(2);
        let (system, old, recent) = split_history(&msgs, 0);
        assert_eq!(system.len(), 1);
        assert_eq!(old.len(), 4);
        assert!(recent.is_empty());
    }

    // ── LLMSummaryCompressor ───────────────────────────────────────────

    #[tokio::test]
    async fn test_summary_reconstruction() {
        let provider = SummaryProvider::new("SUMMARY");
        let compressor = LLMSummaryCompressor::new(provider.clone()).with_keep_recent(2);

        let msgs = conversation(4);
        let result = compressor.compress(msgs.clone()).await.unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], Message::system("You are helpful."));
        assert_eq!(result[1].role, Role::User);
        assert!(result[1].text().contains("SUMMARY"));
        assert_eq!(result[2].role, Role::Assistant);
        assert!(result[2].text().starts_with("Acknowledged"));
        assert_eq!(result[3..], msgs[7..]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_summary_payload_is_old_history_plus_instruction() {
        let provider = SummaryProvider::new("SUMMARY");
        let compressor = LLMSummaryCompressor::new(provider.clone())
            .with_keep_recent(2)
            .with_instruction("Summarize the conversation");

        compressor.compress(conversation(4)).await.unwrap();

        let payload = provider.last_payload.lock().unwrap();
        // 3 old turns + instruction, no system prompt
        assert_eq!(payload.len(), 7);
        assert_eq!(payload[0], Message::user("question 0"));
        assert_eq!(payload[6], Message::user("Summarize the conversation"));
    }

    #[tokio::test]
    async fn test_summary_too_short_to_compress() {
        let provider = SummaryProvider::new("SUMMARY");
        let compressor = LLMSummaryCompressor::new(provider.clone()).with_keep_recent(4);
        let msgs = conversation(2); // 5 messages <= keep_recent + 1
        let result = compressor.compress(msgs.clone()).await.unwrap();
        assert_eq!(result, msgs);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_skipped_without_turn_boundary() {
        let provider = SummaryProvider::new("SUMMARY");
        let compressor = LLMSummaryCompressor::new(provider.clone()).with_keep_recent(2);
        let msgs = vec![
            Message::user("start"),
            Message::assistant("a1"),
            Message::assistant("a2"),
            Message::assistant("a3"),
            Message::assistant("a4"),
        ];
        let result = compressor.compress(msgs.clone()).await.unwrap();
        assert_eq!(result, msgs);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_provider_failure_returns_original() {
        let compressor = LLMSummaryCompressor::new(Arc::new(FailingProvider)).with_keep_recent(2);
        let msgs = conversation(4);
        let result = compressor.compress(msgs.clone()).await.unwrap();
        assert_eq!(result, msgs);
    }

    #[tokio::test]
    async fn test_summary_empty_completion_returns_original() {
        let compressor = LLMSummaryCompressor::new(SummaryProvider::new("   ")).with_keep_recent(2);
        let msgs = conversation(4);
        let result = compressor.compress(msgs.clone()).await.unwrap();
        assert_eq!(result, msgs);
    }

    #[tokio::test]
    async fn test_summary_keep_zero() {
        let compressor = LLMSummaryCompressor::new(SummaryProvider::new("S")).with_keep_recent(0);
        let result = compressor.compress(conversation(2)).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[2].role, Role::Assistant);
    }

    #[test]
    fn test_summary_defaults() {
        let compressor = LLMSummaryCompressor::new(SummaryProvider::new("S"));
        assert_eq!(compressor.keep_recent(), 4);
        assert_eq!(compressor.threshold(), 0.82);
        assert!(compressor.instruction().contains("user's language"));
        assert_eq!(compressor.name(), "llm_summary");
    }
}
