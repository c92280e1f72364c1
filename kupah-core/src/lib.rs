//! Domain model for the kupah medical-assistant core.
//!
//! This crate holds everything the other kupah crates agree on:
//!
//! * [`enums`] — string-tagged domain enums (HMO, membership tier, gender,
//!   locale, dialogue phase) with their canonical wire values.
//! * [`message`] — the role-tagged chat [`message::Message`] unit shared by
//!   the orchestrator and the LLM client.
//! * [`profile`] — the [`profile::UserProfile`] plus the session and wire
//!   DTOs ([`profile::SessionBundle`], [`profile::ChatRequest`],
//!   [`profile::ChatResponse`]).
//! * [`validate`] — completeness/validity predicates over a profile.
//! * [`patch`] — LLM-proposed partial profile updates and the canonicalizing
//!   merge that applies them safely.
//! * [`telemetry`] — one-call `tracing` bootstrap for host processes.
//!
//! Canonical values are Hebrew strings for HMO and tier; normalization of
//! user-facing synonyms happens exclusively inside [`patch::merge_patch`].

pub mod enums;
pub mod message;
pub mod patch;
pub mod profile;
pub mod telemetry;
pub mod validate;

pub use enums::{Gender, Hmo, Locale, Phase, Tier};
pub use message::{Message, Role};
pub use patch::{ProfilePatch, merge_patch};
pub use profile::{
    ChatRequest, ChatResponse, ConversationHistory, SessionBundle, Turn, UserProfile,
};
pub use validate::{is_profile_complete, profile_problems};
