//! Agent module - conversation context lifecycle
//!
//! Every chat turn the surrounding pipeline hands the full candidate history
//! to [`ContextManager::process`] before calling the LLM. The manager keeps
//! that history inside the model's context window:
//!
//! - [`token_counter`] measures a history, preferring the provider's own
//!   usage figure when one is available
//! - [`truncator`] holds the structural cuts (turn cap, oldest-turn drop,
//!   halving) and the orphaned-tool repair they all finish with
//! - [`compaction`] defines the pluggable [`ContextCompressor`] strategies
//! - [`manager`] orchestrates them in a fixed pipeline
//!
//! # Architecture
//!
//! ```text
//!  history ──> turn cap ──> count tokens ──> over threshold? ──no──> send
//!                                                 │yes
//!                                                 ▼
//!                                             compress ──> still over? ──yes──> halve ──> send
//!                                                               │no
//!                                                               ▼
//!                                                              send
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use relaybot::agent::{ContextConfig, ContextManager};
//!
//! async fn before_llm_call(history: Vec<Message>, provider: Arc<dyn LLMProvider>) {
//!     let manager = ContextManager::new(
//!         ContextConfig::new()
//!             .with_max_context_tokens(128_000)
//!             .with_llm_compress_provider(provider),
//!     );
//!     let to_send = manager.process(history, 0).await;
//! }
//! ```

pub mod compaction;
pub mod config;
pub mod manager;
pub mod token_counter;
pub mod truncator;

pub use compaction::{
    split_history, ContextCompressor, LLMSummaryCompressor, TruncateByTurnsCompressor,
};
pub use config::ContextConfig;
pub use manager::ContextManager;
pub use token_counter::{EstimateTokenCounter, TokenCounter};
pub use truncator::{
    fix_messages, truncate_by_dropping_oldest_turns, truncate_by_halving, truncate_by_turns,
};
