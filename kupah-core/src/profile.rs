//! User profile, conversation history, and the gateway-facing wire DTOs.

use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{Gender, Hmo, Locale, Phase, Tier};

/// Personal and membership details collected during the info phase and used
/// as the retrieval bias during Q&A.
///
/// All collected fields are optional while collection is in progress; the
/// predicates in [`crate::validate`] decide when the profile is complete.
/// Mutation happens only through [`crate::patch::merge_patch`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Israeli Teudat Zehut, stored as a 9-digit string.
    pub id_number: Option<String>,
    #[serde(default, deserialize_with = "de_gender_nullable")]
    pub gender: Gender,
    /// Constrained to 1900..=current year; age must land in 0..=120.
    pub birth_year: Option<i32>,
    pub hmo_name: Option<Hmo>,
    /// HMO membership card, stored as a 9-digit string.
    pub hmo_card_number: Option<String>,
    pub membership_tier: Option<Tier>,
    /// Fallback locale seed only; the session locale is authoritative.
    pub locale: Option<Locale>,
}

/// Treats an explicit `null` the same as an absent key.
fn de_gender_nullable<'de, D>(deserializer: D) -> Result<Gender, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Gender>::deserialize(deserializer)?.unwrap_or_default())
}

/// One round of conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user_text: Option<String>,
    pub assistant_text: Option<String>,
    /// Source URIs cited by the assistant text, in retrieval order.
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Ordered sequence of turns; append-only during a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Appends one completed round.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

/// Everything the caller persists between requests: profile, history, phase,
/// and locale. The orchestrator holds no session state of its own.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub history: ConversationHistory,
    #[serde(default)]
    pub phase: Phase,
    pub locale: Option<Locale>,
    pub request_id: Option<String>,
}

impl SessionBundle {
    /// The locale that governs this session. The session's own value is
    /// authoritative; the profile locale is only a fallback seed.
    #[must_use]
    pub fn effective_locale(&self) -> Locale {
        self.locale
            .or(self.user_profile.locale)
            .unwrap_or_default()
    }
}

/// Wire request from the gateway.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_bundle: SessionBundle,
    pub user_input: String,
}

/// Wire response back to the gateway.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub assistant_text: String,
    pub suggested_phase: Phase,
    pub user_profile: UserProfile,
    #[serde(default)]
    pub citations: Vec<String>,
    /// e.g. `"KB_ERROR"`, `"NO_KB_MATCH"`, `"LLM_ERROR"`.
    #[serde(default)]
    pub validation_flags: Vec<String>,
    pub trace_id: String,
}
