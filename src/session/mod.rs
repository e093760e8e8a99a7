//! Session module - conversation data model
//!
//! Message histories are owned by the surrounding pipeline (persistence is an
//! external concern); this module only defines the value types that flow
//! through it:
//! - [`Message`] with its [`Role`] and optional content / tool calls
//! - [`MessageContent`] and typed [`ContentPart`]s for multimodal input
//! - [`ToolCall`] requests made by the assistant
//!
//! # Example
//!
//! ```
//! use relaybot::session::{Message, Role, ToolCall};
//!
//! let history = vec![
//!     Message::system("You are a helpful bot."),
//!     Message::user("What's the weather?"),
//!     Message::assistant_with_tools(None, vec![ToolCall::new("call_1", "weather", "{}")]),
//!     Message::tool_result("call_1", "sunny"),
//!     Message::assistant("It's sunny."),
//! ];
//! assert_eq!(history[3].role, Role::Tool);
//! ```

pub mod types;

pub use types::{
    validate_messages, ContentPart, FunctionCall, MediaUrl, Message, MessageContent, Role,
    ToolCall,
};
