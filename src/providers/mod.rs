//! Providers module - the LLM provider seam
//!
//! This module defines the `LLMProvider` trait and common types for
//! interacting with LLM backends. Platform-specific clients (OpenAI,
//! Anthropic, Dify, Coze, Dashscope) implement the trait outside this crate;
//! the context core only consumes `text_chat`.
//!
//! # Example
//!
//! ```rust,ignore
//! use relaybot::providers::{LLMProvider, ChatOptions};
//! use relaybot::session::Message;
//!
//! async fn example(provider: &dyn LLMProvider) {
//!     let messages = vec![Message::user("Hello!")];
//!     let response = provider.text_chat(messages, Some("Be brief.")).await.unwrap();
//!     println!("Response: {}", response.completion_text);
//! }
//! ```

pub mod timeout;
mod types;

pub use timeout::TimeoutProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, LLMToolCall, ToolDefinition, Usage};
