//! Timeout provider - decorator that bounds every call to an inner provider.
//!
//! The context manager's summarization call is the only suspension point on
//! the chat-turn hot path, so a hung provider must surface as an error
//! instead of stalling the turn.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use relaybot::providers::TimeoutProvider;
//!
//! let provider = TimeoutProvider::new(inner, Duration::from_secs(30));
//! // Use `provider` as any other LLMProvider; slow calls fail with ProviderError::Timeout.
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ProviderError, Result};
use crate::session::Message;

use super::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};

/// A decorator provider that fails calls exceeding a fixed deadline.
pub struct TimeoutProvider {
    inner: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl std::fmt::Debug for TimeoutProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutProvider")
            .field("inner", &self.inner.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TimeoutProvider {
    /// Wrap `inner` so each `chat` call fails after `timeout`.
    pub fn new(inner: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TimeoutProvider {
    /// Await `call`, failing with `ProviderError::Timeout` past the deadline.
    async fn bounded<F>(&self, call: F) -> Result<LLMResponse>
    where
        F: std::future::Future<Output = Result<LLMResponse>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Provider call timed out"
                );
                Err(ProviderError::Timeout(format!(
                    "{} did not respond within {:?}",
                    self.inner.name(),
                    self.timeout
                ))
                .into())
            }
        }
    }
}

#[async_trait]
impl LLMProvider for TimeoutProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        self.bounded(self.inner.chat(messages, tools, model, options))
            .await
    }

    /// Delegates to the inner provider's own `text_chat`, which may differ
    /// from the default built on `chat`.
    async fn text_chat(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<&str>,
    ) -> Result<LLMResponse> {
        self.bounded(self.inner.text_chat(messages, system_prompt))
            .await
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;

    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl LLMProvider for SlowProvider {
        async fn chat(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(LLMResponse::text("finally"))
        }

        fn default_model(&self) -> &str {
            "slow-model"
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let inner = Arc::new(SlowProvider {
            delay: Duration::from_millis(1),
        });
        let provider = TimeoutProvider::new(inner, Duration::from_secs(5));
        let response = provider.text_chat(vec![Message::user("hi")], None).await;
        assert_eq!(response.unwrap().completion_text, "finally");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let inner = Arc::new(SlowProvider {
            delay: Duration::from_secs(600),
        });
        let provider = TimeoutProvider::new(inner, Duration::from_secs(30));
        let err = provider
            .text_chat(vec![Message::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::ProviderTyped(ProviderError::Timeout(_))
        ));
        assert!(err.to_string().contains("slow did not respond"));
    }

    /// `chat` always fails; only the dedicated `text_chat` endpoint works.
    struct TextOnlyProvider {
        delay: Duration,
    }

    #[async_trait]
    impl LLMProvider for TextOnlyProvider {
        async fn chat(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            Err(ProviderError::InvalidRequest("chat endpoint disabled".into()).into())
        }

        async fn text_chat(
            &self,
            _messages: Vec<Message>,
            _system_prompt: Option<&str>,
        ) -> Result<LLMResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(LLMResponse::text("SUMMARY"))
        }

        fn default_model(&self) -> &str {
            "text-only"
        }

        fn name(&self) -> &str {
            "text_only"
        }
    }

    #[tokio::test]
    async fn test_text_chat_reaches_inner_override() {
        let inner = Arc::new(TextOnlyProvider {
            delay: Duration::ZERO,
        });
        let provider = TimeoutProvider::new(inner, Duration::from_secs(5));
        let response = provider
            .text_chat(vec![Message::user("summarize")], None)
            .await
            .unwrap();
        assert_eq!(response.completion_text, "SUMMARY");
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_chat_override_is_bounded() {
        let inner = Arc::new(TextOnlyProvider {
            delay: Duration::from_secs(600),
        });
        let provider = TimeoutProvider::new(inner, Duration::from_secs(30));
        let err = provider
            .text_chat(vec![Message::user("summarize")], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::ProviderTyped(ProviderError::Timeout(_))
        ));
    }

    #[test]
    fn test_delegates_identity() {
        let inner = Arc::new(SlowProvider {
            delay: Duration::ZERO,
        });
        let provider = TimeoutProvider::new(inner, Duration::from_secs(1));
        assert_eq!(provider.name(), "slow");
        assert_eq!(provider.default_model(), "slow-model");
        assert_eq!(provider.timeout(), Duration::from_secs(1));
    }
}
