//! Integration tests for RelayBot
//!
//! These tests drive the public API end to end: configuration feeding the
//! context manager, the summary path through mock providers, provider
//! timeouts, and the structural guarantees of every output.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relaybot::agent::truncator::is_well_formed;
use relaybot::agent::{fix_messages, truncate_by_dropping_oldest_turns, ContextCompressor};
use relaybot::config::Config;
use relaybot::session::{Message, Role, ToolCall};
use relaybot::{
    ChatOptions, ContextConfig, ContextManager, LLMProvider, LLMResponse, ProviderError, Result,
    ToolDefinition, Usage,
};
use tempfile::tempdir;

// ============================================================================
// Mock providers
// ============================================================================

/// Replies with a fixed summary and counts calls.
struct SummaryProvider {
    reply: String,
    calls: AtomicUsize,
}

impl SummaryProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LLMProvider for SummaryProvider {
    async fn chat(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<ToolDefinition>,
        _model: Option<&str>,
        _options: ChatOptions,
    ) -> Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LLMResponse::text(&self.reply).with_usage(Usage::new(500, 20)))
    }

    fn default_model(&self) -> &str {
        "mock-summary"
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Serves summaries only through its own `text_chat`; plain `chat` fails.
struct TextChatProvider {
    text_calls: AtomicUsize,
}

#[async_trait]
impl LLMProvider for TextChatProvider {
    async fn chat(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<ToolDefinition>,
        _model: Option<&str>,
        _options: ChatOptions,
    ) -> Result<LLMResponse> {
        Err(ProviderError::InvalidRequest("use the completion endpoint".into()).into())
    }

    async fn text_chat(
        &self,
        _messages: Vec<Message>,
        _system_prompt: Option<&str>,
    ) -> Result<LLMResponse> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LLMResponse::text("SUMMARY"))
    }

    fn default_model(&self) -> &str {
        "completion"
    }

    fn name(&self) -> &str {
        "text_chat"
    }
}

/// Never answers.
struct HangingProvider;

#[async_trait]
impl LLMProvider for HangingProvider {
    async fn chat(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<ToolDefinition>,
        _model: Option<&str>,
        _options: ChatOptions,
    ) -> Result<LLMResponse> {
        std::future::pending().await
    }

    fn default_model(&self) -> &str {
        "hanging"
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

fn conversation(turns: usize, text_len: usize) -> Vec<Message> {
    let mut msgs = vec![Message::system("You are a helpful chatbot.")];
    for i in 0..turns {
        msgs.push(Message::user(&format!("{} {}", i, "q".repeat(text_len))));
        msgs.push(Message::assistant(&format!("{} {}", i, "a".repeat(text_len))));
    }
    msgs
}

// ============================================================================
// Truncation scenarios
// ============================================================================

#[test]
fn test_basic_turn_drop() {
    let msgs: Vec<Message> = conversation(5, 3).into_iter().skip(1).collect();
    let result = truncate_by_dropping_oldest_turns(msgs, 2);
    assert_eq!(result.len(), 6);
    assert_eq!(result[0].role, Role::User);
}

#[test]
fn test_orphaned_tool_message_repair() {
    assert!(fix_messages(vec![Message::tool_result("call_1", "42")]).is_empty());
}

#[tokio::test]
async fn test_turn_cap_cuts_mid_tool_exchange() {
    let msgs = vec![
        Message::system("sys"),
        Message::user("weather?"),
        Message::assistant_with_tools(None, vec![ToolCall::new("call_1", "weather", "{}")]),
        Message::tool_result("call_1", "sunny"),
        Message::assistant("It's sunny."),
        Message::user("thanks"),
        Message::assistant("You're welcome."),
    ];
    let manager = ContextManager::new(ContextConfig::new().with_enforce_max_turns(1));

    let result = manager.process(msgs, 0).await;

    assert!(is_well_formed(&result));
    assert_eq!(result[0], Message::system("sys"));
    assert_eq!(result.last(), Some(&Message::assistant("You're welcome.")));
}

// ============================================================================
// Config -> manager
// ============================================================================

#[tokio::test]
async fn test_config_file_drives_manager() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"context": {"enforce_max_turns": 2, "truncate_turns": 1}}"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    config.validate().unwrap();
    let manager = ContextManager::new(config.context.to_context_config());

    let result = manager.process(conversation(6, 5), 0).await;
    assert_eq!(result.len(), 5);
    assert_eq!(result[0].role, Role::System);
}

// ============================================================================
// Summary compression
// ============================================================================

#[tokio::test]
async fn test_summary_compression_through_manager() {
    let provider = SummaryProvider::new("The user asked five questions about q.");
    let manager = ContextManager::new(
        ContextConfig::new()
            .with_max_context_tokens(200)
            .with_llm_compress_keep_recent(2)
            .with_llm_compress_provider(provider.clone()),
    );
    let msgs = conversation(5, 60);

    let result = manager.process(msgs.clone(), 0).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.len(), 5);
    assert_eq!(result[0], msgs[0]);
    assert!(result[1].text().contains("five questions"));
    assert_eq!(result[2].role, Role::Assistant);
    assert_eq!(result[3..], msgs[9..]);
    assert!(is_well_formed(&result));
}

#[tokio::test]
async fn test_summary_uses_provider_text_chat_with_default_timeout() {
    let provider = Arc::new(TextChatProvider {
        text_calls: AtomicUsize::new(0),
    });
    let config = ContextConfig::new()
        .with_max_context_tokens(250)
        .with_llm_compress_keep_recent(2)
        .with_llm_compress_provider(provider.clone());
    assert!(config.llm_compress_timeout.is_some());
    let manager = ContextManager::new(config);
    let msgs = conversation(6, 60);

    let result = manager.process(msgs.clone(), 0).await;

    assert_eq!(provider.text_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.len(), 5);
    assert_eq!(
        result[1],
        Message::user("Our previous history conversation summary: SUMMARY")
    );
    assert_eq!(result[3..], msgs[11..]);
}

#[tokio::test]
async fn test_oversized_summary_falls_back_to_halving() {
    let provider = SummaryProvider::new(&"s".repeat(2000));
    let manager = ContextManager::new(
        ContextConfig::new()
            .with_max_context_tokens(200)
            .with_llm_compress_keep_recent(2)
            .with_llm_compress_provider(provider.clone()),
    );

    let result = manager.process(conversation(5, 60), 0).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    // [system, summary, ack, user, assistant] halved: drop summary + ack
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].role, Role::System);
    assert_eq!(result[1].role, Role::User);
    assert!(is_well_formed(&result));
}

#[tokio::test(start_paused = true)]
async fn test_hung_summary_provider_times_out() {
    let manager = ContextManager::new(
        ContextConfig::new()
            .with_max_context_tokens(200)
            .with_llm_compress_keep_recent(2)
            .with_llm_compress_timeout(Some(Duration::from_secs(5)))
            .with_llm_compress_provider(Arc::new(HangingProvider)),
    );
    let msgs = conversation(5, 60);

    let result = manager.process(msgs.clone(), 0).await;

    // summary failed, original still over budget, halving applied
    assert!(result.len() < msgs.len());
    assert_eq!(result[0], msgs[0]);
    assert!(is_well_formed(&result));
}

// ============================================================================
// Custom strategies
// ============================================================================

struct KeepLastTurn;

#[async_trait]
impl ContextCompressor for KeepLastTurn {
    fn name(&self) -> &str {
        "keep_last_turn"
    }

    fn threshold(&self) -> f64 {
        0.5
    }

    async fn compress(&self, messages: Vec<Message>) -> Result<Vec<Message>> {
        let keep = messages.len().saturating_sub(2);
        let mut out: Vec<Message> = messages
            .iter()
            .take_while(|m| m.role == Role::System)
            .cloned()
            .collect();
        out.extend(messages.into_iter().skip(keep.max(out.len())));
        Ok(out)
    }
}

#[tokio::test]
async fn test_custom_compressor_and_threshold() {
    let manager = ContextManager::new(
        ContextConfig::new()
            .with_max_context_tokens(100)
            .with_custom_compressor(Arc::new(KeepLastTurn)),
    );
    assert_eq!(manager.compressor_name(), "keep_last_turn");

    // 60% usage: over the custom 0.5 threshold, under the default 0.82
    let result = manager.process(conversation(3, 5), 60).await;
    assert_eq!(result.len(), 3);
    assert_eq!(result[1].role, Role::User);
}

#[tokio::test]
async fn test_concurrent_processing_shares_manager() {
    let manager = Arc::new(ContextManager::new(
        ContextConfig::new()
            .with_max_context_tokens(150)
            .with_enforce_max_turns(4),
    ));

    let handles: Vec<_> = (1..=8)
        .map(|turns| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.process(conversation(turns, 20), 0).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result[0].role, Role::System);
        assert!(is_well_formed(&result));
    }
}
