//! Text-embedding capability, its Azure adapter, and a deterministic mock.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::AzureOpenAiConfig;
use crate::error::AzureError;
use crate::retry::retry_loop;
use crate::telemetry::TelemetryHooks;

/// Batch size used when the caller has no preference.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Embedding capability the ingester and retriever depend on.
///
/// Implementations must preserve input order and return one vector per
/// input text; all vectors from one deployment share a dimensionality.
#[async_trait]
pub trait EmbeddingsClient: Send + Sync {
    async fn embed_texts(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, AzureError>;
}

/// Azure embeddings adapter with batching and bounded retries.
#[derive(Clone, Debug)]
pub struct AzureEmbeddingsClient {
    cfg: AzureOpenAiConfig,
    http: reqwest::Client,
    hooks: TelemetryHooks,
}

impl AzureEmbeddingsClient {
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

    /// The deployment identifier baked into the cache fingerprint.
    #[must_use]
    pub fn deployment(&self) -> &str {
        &self.cfg.embeddings_deployment
    }

    async fn embed_batch(&self, url: &str, batch: &[String]) -> Result<Vec<Vec<f32>>, AzureError> {
        let response = self
            .http
            .post(url)
            .header("api-key", &self.cfg.api_key)
            .json(&json!({ "input": batch }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AzureError::from_status(status.as_u16(), text));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| AzureError::InvalidResponse(err.to_string()))?;
        if parsed.data.len() != batch.len() {
            return Err(AzureError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }
        // Azure returns rows in input order.
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingsClient for AzureEmbeddingsClient {
    async fn embed_texts(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, AzureError> {
        let url = self
            .cfg
            .deployment_url(&self.cfg.embeddings_deployment, "embeddings");
        let batch_size = batch_size.max(1);

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let batch_vectors = retry_loop(
                || self.embed_batch(&url, batch),
                self.cfg.max_retries,
                self.cfg.backoff_base,
                &self.hooks,
                "azure.request.error",
            )
            .await?;
            vectors.extend(batch_vectors);
        }

        self.hooks.result(
            "azure.embed.success",
            &json!({
                "deployment": self.cfg.embeddings_deployment,
                "count": texts.len(),
            }),
        );
        Ok(vectors)
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// Deterministic embedder for tests and CI.
///
/// Vectors are seeded from a hash of the input text, so identical texts get
/// identical vectors across runs and processes. The call counter lets tests
/// assert that a cached knowledge base performs zero embedding calls.
#[derive(Debug)]
pub struct MockEmbeddingsClient {
    dim: usize,
    calls: AtomicUsize,
}

impl MockEmbeddingsClient {
    /// Default dimensionality; comfortably above the >100 floor real
    /// deployments guarantee.
    pub const DEFAULT_DIM: usize = 128;

    #[must_use]
    pub fn new() -> Self {
        Self::with_dim(Self::DEFAULT_DIM)
    }

    #[must_use]
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_texts` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        // FNV-1a seed, then a splitmix-style expansion per lane.
        let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            seed ^= u64::from(byte);
            seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
        }
        (0..self.dim)
            .map(|lane| {
                let mut z = seed
                    .wrapping_add((lane as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
                z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
                z ^= z >> 31;
                (z >> 40) as f32 / (1u64 << 23) as f32 - 1.0
            })
            .collect()
    }
}

impl Default for MockEmbeddingsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingsClient for MockEmbeddingsClient {
    async fn embed_texts(
        &self,
        texts: &[String],
        _batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, AzureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}
