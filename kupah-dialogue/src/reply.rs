//! The info-phase JSON contract and its lenient parser.

use serde::{Deserialize, Serialize};

use kupah_core::{Locale, ProfilePatch};

use crate::prompts::parse_fallback_text;

/// Conversation status reported by the info-phase model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoStatus {
    /// Still collecting or correcting fields.
    #[default]
    Asking,
    /// All fields look complete; awaiting explicit user confirmation.
    ReadyToConfirm,
    /// The user explicitly confirmed the summary.
    Confirmed,
}

impl InfoStatus {
    /// Case-insensitive parse; anything unrecognized degrades to `Asking`
    /// so a creative model can never skip the confirmation gate.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "READY_TO_CONFIRM" => InfoStatus::ReadyToConfirm,
            "CONFIRMED" => InfoStatus::Confirmed,
            _ => InfoStatus::Asking,
        }
    }
}

/// Parsed info-phase reply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfoReply {
    pub assistant_say: String,
    pub profile_patch: ProfilePatch,
    pub status: InfoStatus,
}

/// Raw wire shape; every key is optional so partial replies still land.
#[derive(Debug, Default, Deserialize)]
struct RawInfoReply {
    #[serde(default)]
    assistant_say: Option<String>,
    #[serde(default)]
    profile_patch: Option<ProfilePatch>,
    #[serde(default)]
    status: Option<String>,
}

/// Parses the model's JSON-mode output.
///
/// On any parse failure the safe fallback is substituted: a
/// locale-appropriate error sentence, an empty patch, and `Asking` status,
/// so the dialogue stays in collection and the profile is untouched.
#[must_use]
pub fn parse_info_reply(raw: &str, locale: Locale) -> InfoReply {
    match serde_json::from_str::<RawInfoReply>(raw) {
        Ok(parsed) => InfoReply {
            assistant_say: parsed.assistant_say.unwrap_or_default().trim().to_string(),
            profile_patch: parsed.profile_patch.unwrap_or_default(),
            status: parsed
                .status
                .map(|s| InfoStatus::parse_lenient(&s))
                .unwrap_or_default(),
        },
        Err(_) => InfoReply {
            assistant_say: parse_fallback_text(locale).to_string(),
            profile_patch: ProfilePatch::default(),
            status: InfoStatus::Asking,
        },
    }
}
