//! Request-time knobs for the orchestrator.

use tracing::warn;

/// Budgets and retrieval settings consumed on every turn.
#[derive(Clone, Copy, Debug)]
pub struct DialogueConfig {
    /// Chunks requested from the retriever per Q&A turn.
    pub top_k: usize,
    /// Character budget for the composed knowledge context block.
    pub max_context_chars: usize,
    /// Character budget for flattened conversation history.
    pub max_history_chars: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            max_context_chars: 12_000,
            max_history_chars: 42_000,
        }
    }
}

impl DialogueConfig {
    /// Loads `TOP_K`, `MAX_CONTEXT_CHARS`, and `MAX_HISTORY_CHARS` from the
    /// environment (reading `.env` first when present). Unparseable values
    /// fall back to the defaults with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            top_k: env_usize("TOP_K", defaults.top_k),
            max_context_chars: env_usize("MAX_CONTEXT_CHARS", defaults.max_context_chars),
            max_history_chars: env_usize("MAX_HISTORY_CHARS", defaults.max_history_chars),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable env var");
            default
        }),
        Err(_) => default,
    }
}
