//! The two-phase dialogue orchestrator.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use kupah_azure::{ChatClient, ChatOptions};
use kupah_core::{
    ChatRequest, ChatResponse, Locale, Message, Phase, SessionBundle, Turn, is_profile_complete,
    merge_patch, profile_problems,
};
use kupah_kb::HtmlKb;

use crate::config::DialogueConfig;
use crate::history::history_to_messages;
use crate::prompts;
use crate::reply::{InfoStatus, parse_info_reply};

/// Stateless per-request dialogue engine.
///
/// Dependencies are injected at construction: the chat client, the built
/// knowledge base, and the turn budgets. One instance serves concurrent
/// requests; all session state lives in the caller's
/// [`SessionBundle`].
pub struct DialogueOrchestrator {
    chat: Arc<dyn ChatClient>,
    kb: Arc<HtmlKb>,
    cfg: DialogueConfig,
}

impl DialogueOrchestrator {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatClient>, kb: Arc<HtmlKb>, cfg: DialogueConfig) -> Self {
        Self { chat, kb, cfg }
    }

    /// Wire-form entry point: consumes a [`ChatRequest`] and returns the
    /// response. The updated bundle is discarded; gateways that persist
    /// session state should use [`DialogueOrchestrator::handle_turn`].
    pub async fn handle_chat(&self, req: ChatRequest) -> ChatResponse {
        let mut bundle = req.session_bundle;
        self.handle_turn(&mut bundle, &req.user_input).await
    }

    /// Handles one turn against the caller-owned session bundle.
    ///
    /// The bundle's history gains one turn (except on upstream failure) and
    /// its profile is replaced by the merged result; the phase label is
    /// only *suggested* back; the caller decides whether to persist it.
    pub async fn handle_turn(&self, bundle: &mut SessionBundle, user_input: &str) -> ChatResponse {
        let locale = bundle.effective_locale();
        match bundle.phase {
            Phase::InfoCollection => self.turn_info(bundle, user_input, locale).await,
            Phase::Qna => self.turn_qna(bundle, user_input, locale).await,
        }
    }

    async fn turn_info(
        &self,
        bundle: &mut SessionBundle,
        user_input: &str,
        locale: Locale,
    ) -> ChatResponse {
        let trace_id = trace_id_for(bundle);
        let profile = &bundle.user_profile;

        let problems = profile_problems(profile);
        let snapshot =
            serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());
        let validation_line = if problems.is_empty() {
            "VALIDATION: OK".to_string()
        } else {
            format!("VALIDATION: MISSING/INVALID -> {}", problems.join("; "))
        };

        let mut messages = vec![
            Message::system(prompts::sys_prompt_info(locale)),
            Message::system(format!("PROFILE_SNAPSHOT_JSON: {snapshot}")),
            Message::system(validation_line),
        ];
        messages.extend(history_to_messages(&bundle.history, self.cfg.max_history_chars));
        messages.push(Message::user(user_input));

        let raw = match self.chat.chat(&messages, &ChatOptions::json(350)).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(trace_id = %trace_id, error = %err, "LLM error during info phase");
                return ChatResponse {
                    assistant_text: prompts::llm_error_text(locale).to_string(),
                    suggested_phase: Phase::InfoCollection,
                    user_profile: bundle.user_profile.clone(),
                    citations: vec![],
                    validation_flags: vec!["LLM_ERROR".to_string()],
                    trace_id,
                };
            }
        };

        let reply = parse_info_reply(&raw, locale);
        let assistant_text = if reply.assistant_say.is_empty() {
            prompts::empty_say_text(locale).to_string()
        } else {
            reply.assistant_say.clone()
        };

        let merged = merge_patch(&bundle.user_profile, &reply.profile_patch, Some(&trace_id));
        let now_complete = is_profile_complete(&merged);

        let suggested_phase = if reply.status == InfoStatus::Confirmed && now_complete {
            info!(trace_id = %trace_id, "profile confirmed, suggesting Q&A phase");
            Phase::Qna
        } else {
            Phase::InfoCollection
        };

        bundle.history.push_turn(Turn {
            user_text: Some(user_input.to_string()),
            assistant_text: Some(assistant_text.clone()),
            citations: vec![],
        });
        bundle.user_profile = merged.clone();

        ChatResponse {
            assistant_text,
            suggested_phase,
            user_profile: merged,
            citations: vec![],
            validation_flags: vec![],
            trace_id,
        }
    }

    async fn turn_qna(
        &self,
        bundle: &mut SessionBundle,
        user_input: &str,
        locale: Locale,
    ) -> ChatResponse {
        let trace_id = trace_id_for(bundle);
        let profile = bundle.user_profile.clone();

        let mut hints: Vec<&str> = Vec::new();
        if let Some(hmo) = profile.hmo_name {
            hints.push(hmo.as_str());
        }
        if let Some(tier) = profile.membership_tier {
            hints.push(tier.as_str());
        }
        let retrieval_query = if hints.is_empty() {
            user_input.to_string()
        } else {
            format!("{user_input} | {}", hints.join(" | "))
        };

        let found = match self
            .kb
            .search(
                &retrieval_query,
                profile.hmo_name,
                profile.membership_tier,
                self.cfg.top_k,
            )
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!(trace_id = %trace_id, error = %err, "KB search error");
                return ChatResponse {
                    assistant_text: prompts::kb_error_text(locale).to_string(),
                    suggested_phase: Phase::Qna,
                    user_profile: profile,
                    citations: vec![],
                    validation_flags: vec!["KB_ERROR".to_string()],
                    trace_id,
                };
            }
        };

        if found.is_empty() {
            info!(trace_id = %trace_id, "no KB results for query");
            return ChatResponse {
                assistant_text: prompts::no_match_text(locale).to_string(),
                suggested_phase: Phase::Qna,
                user_profile: profile,
                citations: vec![],
                validation_flags: vec!["NO_KB_MATCH".to_string()],
                trace_id,
            };
        }

        // Context lines are positional: answer reference [i] resolves to
        // citations[i-1].
        let mut parts: Vec<String> = Vec::with_capacity(found.len());
        let mut citations: Vec<String> = Vec::with_capacity(found.len());
        for (i, chunk) in found.iter().enumerate() {
            parts.push(format!(
                "[{}] {} | {} | {} | {} | {} | {} | {}",
                i + 1,
                chunk.section.as_deref().unwrap_or(""),
                chunk.service.as_deref().unwrap_or(""),
                chunk.hmo.map(|h| h.as_str()).unwrap_or(""),
                chunk.tier_tags_str(),
                chunk.text,
                chunk.source_uri,
                chunk.kind_str(),
            ));
            citations.push(chunk.source_uri.clone());
        }
        let mut context = parts.join("\n\n");
        if context.chars().count() > self.cfg.max_context_chars {
            context = context
                .chars()
                .take(self.cfg.max_context_chars.saturating_sub(1))
                .collect();
            context.push('…');
        }

        let profile_line = format!(
            "HMO={} | Tier={} | Gender={} | BirthYear={}",
            profile.hmo_name.map(|h| h.as_str()).unwrap_or(""),
            profile.membership_tier.map(|t| t.as_str()).unwrap_or(""),
            profile.gender,
            profile
                .birth_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
        );

        let mut messages = vec![
            Message::system(prompts::sys_prompt_qna(locale)),
            Message::system(format!("Knowledge snippets:\n{context}")),
            Message::system(format!("User {profile_line}")),
        ];
        messages.extend(history_to_messages(&bundle.history, self.cfg.max_history_chars));
        messages.push(Message::user(format!(
            "{}\n\n{}",
            prompts::user_instructions_qna(locale),
            user_input
        )));

        let answer = match self.chat.chat(&messages, &ChatOptions::text(600)).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(trace_id = %trace_id, error = %err, "LLM error during Q&A phase");
                return ChatResponse {
                    assistant_text: prompts::llm_error_text(locale).to_string(),
                    suggested_phase: Phase::Qna,
                    user_profile: profile,
                    citations: vec![],
                    validation_flags: vec!["LLM_ERROR".to_string()],
                    trace_id,
                };
            }
        };

        bundle.history.push_turn(Turn {
            user_text: Some(user_input.to_string()),
            assistant_text: Some(answer.clone()),
            citations: citations.clone(),
        });

        ChatResponse {
            assistant_text: answer,
            suggested_phase: Phase::Qna,
            user_profile: profile,
            citations,
            validation_flags: vec![],
            trace_id,
        }
    }
}

fn trace_id_for(bundle: &SessionBundle) -> String {
    bundle
        .request_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
