//! Message types for RelayBot
//!
//! This module defines the conversation data model shared by the pipeline,
//! the context manager and LLM providers: roles, messages, typed content
//! parts and tool calls. The JSON shape follows the OpenAI chat format so a
//! persisted history can be fed back in unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// A single message in a conversation.
///
/// Only assistant messages that carry tool calls may omit `content`; every
/// other message must have it (see [`Message::validate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// Plain text or typed content parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    /// Tool calls made by the assistant (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// ID of the tool call this message is responding to (for tool results)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text_message(role: Role, content: &str) -> Self {
        Self {
            role,
            content: Some(MessageContent::Text(content.to_string())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use relaybot::session::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self::text_message(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: &str) -> Self {
        Self::text_message(Role::Assistant, content)
    }

    /// Create a new system message.
    ///
    /// System messages carry prompts and instructions and are never dropped
    /// by context truncation.
    pub fn system(content: &str) -> Self {
        Self::text_message(Role::System, content)
    }

    /// Create a new tool result message answering `tool_call_id`.
    ///
    /// # Example
    /// ```
    /// use relaybot::session::{Message, Role};
    ///
    /// let msg = Message::tool_result("call_123", "Tool executed successfully");
    /// assert_eq!(msg.role, Role::Tool);
    /// assert_eq!(msg.tool_call_id, Some("call_123".to_string()));
    /// ```
    pub fn tool_result(tool_call_id: &str, content: &str) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.to_string()),
            ..Self::text_message(Role::Tool, content)
        }
    }

    /// Create an assistant message with tool calls.
    ///
    /// `content` may be `None`; tool-calling assistant turns are the only
    /// messages allowed to have no content.
    ///
    /// # Example
    /// ```
    /// use relaybot::session::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "search", r#"{"query": "rust"}"#);
    /// let msg = Message::assistant_with_tools(None, vec![call]);
    /// assert!(msg.has_tool_calls());
    /// assert!(msg.validate().is_ok());
    /// ```
    pub fn assistant_with_tools(content: Option<&str>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.map(|c| MessageContent::Text(c.to_string())),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a message whose content is a list of typed parts.
    pub fn with_parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: Some(MessageContent::Parts(parts)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Check if this message has tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Check if this is a tool result message.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_call_id.is_some()
    }

    /// Text segments of this message: the plain string, or each text part.
    ///
    /// Reasoning, image and audio parts are not included.
    pub fn text_segments(&self) -> Vec<&str> {
        match &self.content {
            Some(MessageContent::Text(text)) => vec![text.as_str()],
            Some(MessageContent::Parts(parts)) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// All text segments joined with newlines.
    pub fn text(&self) -> String {
        self.text_segments().join("\n")
    }

    /// Check the role/content invariant.
    ///
    /// An assistant message with tool calls may have no content; every other
    /// message requires content.
    pub fn validate(&self) -> Result<()> {
        if self.role == Role::Assistant && self.tool_calls.is_some() {
            return Ok(());
        }
        if self.content.is_none() {
            return Err(RelayError::InvalidMessage(format!(
                "{} message requires content unless it is an assistant message with tool calls",
                self.role
            )));
        }
        Ok(())
    }
}

/// Validate every message of a sequence, reporting the first offending index.
pub fn validate_messages(messages: &[Message]) -> Result<()> {
    for (index, message) in messages.iter().enumerate() {
        message.validate().map_err(|e| match e {
            RelayError::InvalidMessage(msg) => {
                RelayError::InvalidMessage(format!("message {}: {}", index, msg))
            }
            other => other,
        })?;
    }
    Ok(())
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Messages from the user
    User,
    /// Messages from the AI assistant
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Message content: a plain string or an ordered list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// A typed part of multimodal message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text { text: String },
    /// Model reasoning, optionally with an encrypted signature
    Think {
        think: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted: Option<String>,
    },
    /// Image reference (URL or data URI)
    ImageUrl { image_url: MediaUrl },
    /// Audio reference (URL or data URI)
    AudioUrl { audio_url: MediaUrl },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: &str) -> Self {
        ContentPart::Text {
            text: text.to_string(),
        }
    }
}

/// URL of an image or audio attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaUrl {
    /// HTTP(S) URL or `data:` URI
    pub url: String,
    /// Optional ID so models can tell attachments apart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A tool call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Always `"function"`
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub call_type: String,
    /// Unique identifier for this tool call
    pub id: String,
    /// The function to invoke
    pub function: FunctionCall,
    /// Provider-specific metadata carried alongside the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_content: Option<serde_json::Value>,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

/// Name and JSON-encoded arguments of a called function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Option<String>,
}

impl ToolCall {
    /// Create a new function tool call.
    ///
    /// # Example
    /// ```
    /// use relaybot::session::ToolCall;
    ///
    /// let call = ToolCall::new("call_123", "web_search", r#"{"query": "rust programming"}"#);
    /// assert_eq!(call.function.name, "web_search");
    /// ```
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            call_type: default_tool_call_type(),
            id: id.to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: Some(arguments.to_string()),
            },
            extra_content: None,
        }
    }

    /// Parse the arguments as a specific type.
    ///
    /// Missing arguments parse as an empty JSON object.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.function.arguments.as_deref().unwrap_or("{}"))
    }
}
