//! The chat-wire message unit.
//!
//! Every completion call the orchestrator makes is an ordered `Vec` of
//! these: system messages carry the grounding material (phase prompt,
//! `PROFILE_SNAPSHOT_JSON`, validation line, knowledge snippets), user and
//! assistant messages carry the visible conversation replayed from
//! [`crate::profile::ConversationHistory`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message.
///
/// Serializes to the lowercase wire values the completion API expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and grounding context supplied by the orchestrator.
    System,
    /// Input typed by the member.
    User,
    /// Text the assistant produced on an earlier turn.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => f.write_str("system"),
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One role-tagged message in a completion request.
///
/// # Examples
///
/// ```
/// use kupah_core::{Message, Role};
///
/// let msg = Message::user("מה מגיע לי במסלול זהב?");
/// assert_eq!(msg.role, Role::User);
/// assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "user");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// A system message: prompt text, profile snapshot, or retrieved
    /// knowledge context.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A member-authored message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A prior assistant reply, replayed as history.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// True for the conversational roles (user/assistant) that originate
    /// from history rather than from the orchestrator's scaffolding.
    #[must_use]
    pub fn is_conversational(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
    }
}
