//! Optional observation hooks for upstream calls.
//!
//! Hosts can attach callbacks that fire once per successful call and once
//! per failed attempt (including each retried attempt). Hooks receive an
//! event name plus a JSON payload and must not panic; the adapters call
//! them on the request path.

use std::sync::Arc;

/// Callback signature: `(event_name, payload)`.
pub type TelemetryHook = Arc<dyn Fn(&str, &serde_json::Value) + Send + Sync>;

/// Hook pair carried by every adapter. Both slots are optional.
#[derive(Clone, Default)]
pub struct TelemetryHooks {
    pub on_result: Option<TelemetryHook>,
    pub on_error: Option<TelemetryHook>,
}

impl TelemetryHooks {
    /// Hooks that forward both channels to `tracing` at info/warn level.
    #[must_use]
    pub fn log_to_tracing() -> Self {
        Self {
            on_result: Some(Arc::new(|event, payload| {
                tracing::info!(event, %payload, "upstream result");
            })),
            on_error: Some(Arc::new(|event, payload| {
                tracing::warn!(event, %payload, "upstream error");
            })),
        }
    }

    pub(crate) fn result(&self, event: &str, payload: &serde_json::Value) {
        if let Some(hook) = &self.on_result {
            hook(event, payload);
        }
    }

    pub(crate) fn error(&self, event: &str, payload: &serde_json::Value) {
        if let Some(hook) = &self.on_error {
            hook(event, payload);
        }
    }
}

impl std::fmt::Debug for TelemetryHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryHooks")
            .field("on_result", &self.on_result.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn hooks_fire_when_present_and_noop_when_absent() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let hooks = TelemetryHooks {
            on_result: Some(Arc::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            on_error: None,
        };

        hooks.result("azure.chat.success", &serde_json::json!({"len_out": 3}));
        hooks.error("azure.request.error", &serde_json::json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let empty = TelemetryHooks::default();
        empty.result("ignored", &serde_json::Value::Null);
    }
}
