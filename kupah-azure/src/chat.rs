//! Chat-completion capability and its Azure adapter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use kupah_core::Message;

use crate::config::AzureOpenAiConfig;
use crate::error::AzureError;
use crate::retry::retry_loop;
use crate::telemetry::TelemetryHooks;

/// Per-call tuning for a chat completion.
#[derive(Clone, Debug)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// When set, the provider is asked for a single valid JSON object. If it
    /// still returns non-JSON the raw string is passed through; the caller
    /// owns the fallback.
    pub json_mode: bool,
    /// Overrides the configured chat deployment for this call.
    pub deployment: Option<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: None,
            json_mode: false,
            deployment: None,
        }
    }
}

impl ChatOptions {
    #[must_use]
    pub fn json(max_tokens: u32) -> Self {
        Self {
            json_mode: true,
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn text(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }
}

/// Chat-completion capability the orchestrator depends on.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Returns the assistant text for the given ordered messages (a JSON
    /// string when `json_mode` is requested and the provider honors it).
    async fn chat(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, AzureError>;
}

/// Thin Azure chat adapter with optional JSON mode and bounded retries.
#[derive(Clone, Debug)]
pub struct AzureChatClient {
    cfg: AzureOpenAiConfig,
    http: reqwest::Client,
    hooks: TelemetryHooks,
}

impl AzureChatClient {
    pub fn new(cfg: AzureOpenAiConfig) -> Result<Self, AzureError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()?;
        Ok(Self {
            cfg,
            http,
            hooks: TelemetryHooks::default(),
        })
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: TelemetryHooks) -> Self {
        self.hooks = hooks;
        self
    }

    async fn completion(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<String, AzureError> {
        let response = self
            .http
            .post(url)
            .header("api-key", &self.cfg.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AzureError::from_status(status.as_u16(), text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| AzureError::InvalidResponse(err.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AzureError::InvalidResponse("no choices in completion".into()))?
            .message
            .content
            .unwrap_or_default();
        Ok(content)
    }
}

#[async_trait]
impl ChatClient for AzureChatClient {
    async fn chat(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, AzureError> {
        let deployment = opts
            .deployment
            .as_deref()
            .unwrap_or(&self.cfg.chat_deployment);
        let url = self.cfg.deployment_url(deployment, "chat/completions");

        let mut body = json!({
            "messages": messages,
            "temperature": opts.temperature,
        });
        if let Some(max_tokens) = opts.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if opts.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let out = retry_loop(
            || self.completion(&url, &body),
            self.cfg.max_retries,
            self.cfg.backoff_base,
            &self.hooks,
            "azure.request.error",
        )
        .await?;

        self.hooks.result(
            "azure.chat.success",
            &json!({
                "deployment": deployment,
                "json_mode": opts.json_mode,
                "len_messages": messages.len(),
                "len_out": out.len(),
            }),
        );
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
