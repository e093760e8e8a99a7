//! Token counting for conversation context.
//!
//! The context manager needs a token figure for every turn. When the
//! provider reported its own usage for the previous call that figure is
//! authoritative; otherwise [`EstimateTokenCounter`] derives a cheap
//! character-class estimate.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::session::{Message, ToolCall};

/// Weight of one CJK unified ideograph.
const CJK_CHAR_WEIGHT: f64 = 0.6;
/// Weight of any other character.
const OTHER_CHAR_WEIGHT: f64 = 0.3;

/// Counts tokens in a message sequence.
///
/// Implementations must be pure: the same input always yields the same count
/// and counting never fails.
pub trait TokenCounter: Send + Sync {
    /// Count the total tokens in `messages`.
    ///
    /// `trusted_token_usage` is the total the LLM API returned for this
    /// context, or 0 when the API reported none.
    fn count_tokens(&self, messages: &[Message], trusted_token_usage: u64) -> u64;
}

/// Character-class token estimator.
///
/// CJK characters (U+4E00..=U+9FFF) weigh 0.6 tokens, everything else 0.3.
/// Text content (plain or text parts) and serialized tool calls are counted;
/// reasoning, image and audio parts are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateTokenCounter;

impl TokenCounter for EstimateTokenCounter {
    fn count_tokens(&self, messages: &[Message], trusted_token_usage: u64) -> u64 {
        if trusted_token_usage > 0 {
            return trusted_token_usage;
        }

        let mut total = 0;
        for msg in messages {
            for text in msg.text_segments() {
                total += estimate_text_tokens(text);
            }

            if let Some(tool_calls) = &msg.tool_calls {
                for tc in tool_calls {
                    total += tool_call_json(tc)
                        .map(|json| estimate_text_tokens(&json))
                        .unwrap_or(0);
                }
            }
        }
        total
    }
}

/// Estimate the tokens of a single text segment, truncated to an integer.
///
/// # Example
/// ```
/// use relaybot::agent::token_counter::estimate_text_tokens;
///
/// assert_eq!(estimate_text_tokens("hello world"), 3); // 11 * 0.3
/// assert_eq!(estimate_text_tokens("你好"), 1); // 2 * 0.6
/// ```
pub fn estimate_text_tokens(text: &str) -> u64 {
    let (cjk, other) = text.chars().fold((0u64, 0u64), |(cjk, other), c| {
        if is_cjk(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });
    (cjk as f64 * CJK_CHAR_WEIGHT + other as f64 * OTHER_CHAR_WEIGHT) as u64
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Serialize a tool call with `", "` / `": "` separators and every
/// non-ASCII character escaped as `\uXXXX`.
fn tool_call_json(tc: &ToolCall) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
    tc.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
