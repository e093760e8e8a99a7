//! Context pipeline command handlers.

use std::path::Path;

use anyhow::{Context, Result};

use relaybot::agent::{ContextManager, EstimateTokenCounter, TokenCounter};
use relaybot::config::Config;
use relaybot::log_component;
use relaybot::session::{validate_messages, Message};

/// Command-line overrides for the `context` section.
#[derive(Debug, Default)]
pub(crate) struct ContextOverrides {
    pub max_tokens: Option<i64>,
    pub max_turns: Option<i64>,
    pub truncate_turns: Option<i64>,
}

/// Read and validate a JSON message array.
fn read_messages(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let messages: Vec<Message> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of messages", path.display()))?;
    validate_messages(&messages)?;
    Ok(messages)
}

/// Run a history through the context pipeline and print the result.
pub(crate) async fn cmd_context(
    config: &Config,
    input: &Path,
    overrides: ContextOverrides,
    trusted_usage: u64,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(v) = overrides.max_tokens {
        config.context.max_context_tokens = v;
    }
    if let Some(v) = overrides.max_turns {
        config.context.enforce_max_turns = v;
    }
    if let Some(v) = overrides.truncate_turns {
        config.context.truncate_turns = v;
    }
    config.validate()?;

    let messages = read_messages(input)?;
    let manager = ContextManager::new(config.context.to_context_config());

    let tokens_before = manager.count_tokens(&messages, trusted_usage);
    let count_before = messages.len();
    log_component!(
        debug,
        "cli",
        "Processing history",
        messages = count_before,
        tokens = tokens_before
    );

    let processed = manager.process(messages, trusted_usage).await;
    let tokens_after = manager.count_tokens(&processed, 0);

    println!("{}", serde_json::to_string_pretty(&processed)?);
    eprintln!(
        "messages: {} -> {}, tokens: {} -> {}",
        count_before,
        processed.len(),
        tokens_before,
        tokens_after
    );
    Ok(())
}

/// Print the estimated token count of a history.
pub(crate) fn cmd_tokens(input: &Path) -> Result<()> {
    let messages = read_messages(input)?;
    println!("{}", EstimateTokenCounter.count_tokens(&messages, 0));
    Ok(())
}
