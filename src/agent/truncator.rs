//! Structural truncation of conversation history.
//!
//! Pure functions over `Vec<Message>` that shorten a history while keeping it
//! acceptable to chat-completion APIs:
//!
//! - The leading run of system messages (the *system prefix*) is never
//!   dropped, reordered, or counted as a turn.
//! - The non-system part of a truncated history starts with a user message.
//! - A tool message always has at least a user and an assistant message
//!   before it; orphaned tool results left behind by a cut are discarded by
//!   [`fix_messages`].
//!
//! A *turn* is one user message plus the assistant reply that follows it.

use crate::session::{Message, Role};

/// Number of leading system messages.
pub fn system_prefix_len(messages: &[Message]) -> usize {
    messages
        .iter()
        .position(|m| m.role != Role::System)
        .unwrap_or(messages.len())
}

/// Split a history into its system prefix and the remaining messages.
pub fn split_system_prefix(mut messages: Vec<Message>) -> (Vec<Message>, Vec<Message>) {
    let rest = messages.split_off(system_prefix_len(&messages));
    (messages, rest)
}

/// Drop everything before the first user message; no user message means
/// nothing in the window is safe to keep.
fn anchor_at_first_user(mut window: Vec<Message>) -> Vec<Message> {
    match window.iter().position(|m| m.role == Role::User) {
        Some(0) => window,
        Some(index) => window.split_off(index),
        None => Vec::new(),
    }
}

fn rejoin(mut system: Vec<Message>, window: Vec<Message>) -> Vec<Message> {
    system.extend(window);
    system
}

/// Remove tool messages orphaned by an earlier cut.
///
/// Scans forward once. A tool message that arrives while fewer than two
/// non-system messages have been accumulated means the history was cut in
/// the middle of a tool exchange: everything accumulated after the system
/// prefix is discarded along with the tool message, and the scan resumes at
/// the next user message.
///
/// Skipping ahead to a user message is intentional: appending whatever
/// follows the reset (an assistant reply, another tool result) would leave a
/// non-system part that does not start with a user message.
///
/// # Examples
/// ```
/// use relaybot::session::Message;
/// use relaybot::agent::truncator::fix_messages;
///
/// assert!(fix_messages(vec![Message::tool_result("call_1", "42")]).is_empty());
///
/// let msgs = vec![
///     Message::system("sys"),
///     Message::tool_result("call_1", "stale"),
///     Message::assistant("dangling"),
///     Message::user("Hi"),
///     Message::assistant("Hello!"),
/// ];
/// let fixed = fix_messages(msgs);
/// assert_eq!(fixed.len(), 3); // system + the last full turn
/// ```
pub fn fix_messages(messages: Vec<Message>) -> Vec<Message> {
    let (mut fixed, rest) = split_system_prefix(messages);
    let prefix_len = fixed.len();
    let mut resyncing = false;

    for message in rest {
        if resyncing {
            if message.role != Role::User {
                continue;
            }
            resyncing = false;
        }

        if message.role == Role::Tool && fixed.len() - prefix_len < 2 {
            fixed.truncate(prefix_len);
            resyncing = true;
            continue;
        }
        fixed.push(message);
    }
    fixed
}

/// Cap the history at a number of recent turns.
///
/// Once the history holds more than `keep_most_recent_turns` turns, only the
/// newest `keep_most_recent_turns - drop_turns + 1` turns are kept. Dropping
/// a batch of `drop_turns` at once means the cap is not hit again on every
/// following turn.
///
/// # Arguments
/// * `messages` - The full conversation history
/// * `keep_most_recent_turns` - Turn cap; negative means no cap
/// * `drop_turns` - How many turns to drop once the cap is exceeded;
///   negative values count as 0
///
/// # Returns
/// The input unchanged when under the cap, otherwise the system prefix plus
/// a repaired window starting at a user message.
///
/// # Examples
/// ```
/// use relaybot::session::Message;
/// use relaybot::agent::truncator::truncate_by_turns;
///
/// let mut msgs = vec![Message::system("You are helpful.")];
/// for i in 0..5 {
///     msgs.push(Message::user(&format!("question {}", i)));
///     msgs.push(Message::assistant(&format!("answer {}", i)));
/// }
/// let result = truncate_by_turns(msgs, 3, 1);
/// assert_eq!(result.len(), 7); // system + 3 turns
/// ```
pub fn truncate_by_turns(
    messages: Vec<Message>,
    keep_most_recent_turns: i64,
    drop_turns: i64,
) -> Vec<Message> {
    if keep_most_recent_turns < 0 {
        return messages;
    }

    let rest_len = messages.len() - system_prefix_len(&messages);
    if (rest_len / 2) as i64 <= keep_most_recent_turns {
        return messages;
    }

    let (system, mut rest) = split_system_prefix(messages);
    let num_to_keep = keep_most_recent_turns
        .saturating_sub(drop_turns.max(0))
        .saturating_add(1);
    let window = if num_to_keep <= 0 {
        Vec::new()
    } else {
        let keep = (num_to_keep as usize).saturating_mul(2).min(rest.len());
        rest.split_off(rest.len() - keep)
    };

    fix_messages(rejoin(system, anchor_at_first_user(window)))
}

/// Drop the `drop_turns` oldest turns.
///
/// When the history has no more than `drop_turns` turns, the whole
/// non-system part is dropped.
///
/// # Examples
/// ```
/// use relaybot::session::{Message, Role};
/// use relaybot::agent::truncator::truncate_by_dropping_oldest_turns;
///
/// let msgs: Vec<Message> = (0..10)
///     .map(|i| if i % 2 == 0 { Message::user("q") } else { Message::assistant("a") })
///     .collect();
/// let result = truncate_by_dropping_oldest_turns(msgs, 2);
/// assert_eq!(result.len(), 6);
/// assert_eq!(result[0].role, Role::User);
/// ```
pub fn truncate_by_dropping_oldest_turns(messages: Vec<Message>, drop_turns: i64) -> Vec<Message> {
    if drop_turns <= 0 {
        return messages;
    }

    let (system, mut rest) = split_system_prefix(messages);
    let window = if (rest.len() / 2) as i64 <= drop_turns {
        Vec::new()
    } else {
        rest.split_off(drop_turns as usize * 2)
    };

    fix_messages(rejoin(system, anchor_at_first_user(window)))
}

/// Drop the older half of the non-system messages.
///
/// Last-resort reduction: it ignores turn boundaries (re-anchoring at the
/// next user message afterwards) but always shrinks a history of more than
/// two messages whose non-system part has at least two messages.
///
/// # Examples
/// ```
/// use relaybot::session::Message;
/// use relaybot::agent::truncator::truncate_by_halving;
///
/// let msgs: Vec<Message> = (0..20)
///     .map(|i| if i % 2 == 0 { Message::user("q") } else { Message::assistant("a") })
///     .collect();
/// assert_eq!(truncate_by_halving(msgs).len(), 10);
/// ```
pub fn truncate_by_halving(messages: Vec<Message>) -> Vec<Message> {
    if messages.len() <= 2 {
        return messages;
    }

    let rest_len = messages.len() - system_prefix_len(&messages);
    let to_delete = rest_len / 2;
    if to_delete == 0 {
        return messages;
    }

    let (system, mut rest) = split_system_prefix(messages);
    let survivors = rest.split_off(to_delete);

    fix_messages(rejoin(system, anchor_at_first_user(survivors)))
}

/// Check the structural shape every truncation produces: the non-system
/// part is empty or starts with a user message, and each tool message has
/// at least two non-system messages before it.
pub fn is_well_formed(messages: &[Message]) -> bool {
    let rest = &messages[system_prefix_len(messages)..];
    if let Some(first) = rest.first() {
        if first.role != Role::User {
            return false;
        }
    }
    rest.iter()
        .enumerate()
        .all(|(i, m)| m.role != Role::Tool || i >= 2)
}
