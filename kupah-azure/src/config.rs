//! Connection and retry-policy configuration for the Azure adapters.

use std::time::Duration;

use crate::error::AzureError;

/// Frozen configuration for one Azure OpenAI resource.
///
/// Built once at startup (usually via [`AzureOpenAiConfig::from_env`]) and
/// cloned into each adapter; nothing here changes at request time.
#[derive(Clone, Debug)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embeddings_deployment: String,
    /// Per-call timeout applied to every upstream HTTP request.
    pub request_timeout: Duration,
    /// Number of retries after the initial attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on every subsequent attempt.
    pub backoff_base: Duration,
}

impl AzureOpenAiConfig {
    /// Loads configuration from the environment (reading `.env` first when
    /// present).
    ///
    /// Required: `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`.
    /// Optional with defaults: `AZURE_OPENAI_API_VERSION` (2024-10-21),
    /// `CHAT_DEPLOYMENT` (gpt-4o-mini), `EMBEDDINGS_DEPLOYMENT`
    /// (text-embedding-ada-002), `REQUEST_TIMEOUT_S` (30), `MAX_RETRIES`
    /// (3), `BACKOFF_BASE_S` (0.6).
    pub fn from_env() -> Result<Self, AzureError> {
        dotenvy::dotenv().ok();

        let endpoint = require_var("AZURE_OPENAI_ENDPOINT")?;
        let api_key = require_var("AZURE_OPENAI_API_KEY")?;
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| "2024-10-21".to_string());
        let chat_deployment =
            std::env::var("CHAT_DEPLOYMENT").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let embeddings_deployment = std::env::var("EMBEDDINGS_DEPLOYMENT")
            .unwrap_or_else(|_| "text-embedding-ada-002".to_string());

        let request_timeout = Duration::from_secs_f64(parse_var("REQUEST_TIMEOUT_S", 30.0)?);
        let max_retries = parse_var("MAX_RETRIES", 3.0)? as u32;
        let backoff_base = Duration::from_secs_f64(parse_var("BACKOFF_BASE_S", 0.6)?);

        Ok(Self {
            endpoint,
            api_key,
            api_version,
            chat_deployment,
            embeddings_deployment,
            request_timeout,
            max_retries,
            backoff_base,
        })
    }

    /// Base URL for a deployment-scoped operation, e.g.
    /// `.../openai/deployments/<name>/chat/completions?api-version=...`.
    #[must_use]
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint.trim_end_matches('/'),
            deployment,
            operation,
            self.api_version
        )
    }
}

fn require_var(key: &str) -> Result<String, AzureError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AzureError::Config(format!("{key} must be set")))
}

fn parse_var(key: &str, default: f64) -> Result<f64, AzureError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<f64>()
            .map_err(|_| AzureError::Config(format!("{key} must be numeric, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            endpoint: "https://example.openai.azure.com/".into(),
            api_key: "key".into(),
            api_version: "2024-10-21".into(),
            chat_deployment: "gpt-4o-mini".into(),
            embeddings_deployment: "text-embedding-ada-002".into(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(600),
        }
    }

    #[test]
    fn deployment_url_trims_trailing_slash() {
        let cfg = test_config();
        assert_eq!(
            cfg.deployment_url("gpt-4o-mini", "chat/completions"),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-10-21"
        );
    }
}
