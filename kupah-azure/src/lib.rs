//! Azure OpenAI adapters for the kupah medical-assistant core.
//!
//! The rest of the workspace depends only on the two provider traits:
//!
//! * [`ChatClient`] — chat completions, optionally in JSON mode.
//! * [`EmbeddingsClient`] — order-preserving batched text embeddings.
//!
//! [`AzureChatClient`] and [`AzureEmbeddingsClient`] implement them against
//! the Azure OpenAI REST surface with a shared bounded-retry policy
//! (exponential backoff on rate limits, timeouts, and generic API errors;
//! only permanently-failing request statuses skip retry) and optional
//! [`telemetry`] hooks. [`MockEmbeddingsClient`] provides
//! deterministic vectors for CI and cache tests.

pub mod chat;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod retry;
pub mod telemetry;

pub use chat::{AzureChatClient, ChatClient, ChatOptions};
pub use config::AzureOpenAiConfig;
pub use embeddings::{
    AzureEmbeddingsClient, DEFAULT_BATCH_SIZE, EmbeddingsClient, MockEmbeddingsClient,
};
pub use error::AzureError;
pub use telemetry::{TelemetryHook, TelemetryHooks};
