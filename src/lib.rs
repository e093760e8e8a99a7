//! RelayBot - conversation context lifecycle for multi-platform chatbots
//!
//! Keeps each turn's message history inside the LLM context window: a turn
//! cap, token-budget compression (turn dropping or LLM summarization) and a
//! halving fallback, all behind [`ContextManager::process`].

pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod utils;

pub use agent::{
    ContextCompressor, ContextConfig, ContextManager, EstimateTokenCounter,
    LLMSummaryCompressor, TokenCounter, TruncateByTurnsCompressor,
};
pub use config::Config;
pub use error::{ProviderError, RelayError, Result};
pub use providers::{
    ChatOptions, LLMProvider, LLMResponse, LLMToolCall, TimeoutProvider, ToolDefinition, Usage,
};
pub use session::{ContentPart, Message, MessageContent, Role, ToolCall};
