//! The knowledge base: build-or-load construction and biased retrieval.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use kupah_azure::{DEFAULT_BATCH_SIZE, EmbeddingsClient};
use kupah_core::{Hmo, Tier};

use crate::cache::{
    CACHE_VERSION, CachePayload, cache_path, fingerprint, load_cache, scan_manifest, store_cache,
};
use crate::chunk::KbChunk;
use crate::error::KbError;
use crate::parse::extract_chunks;

/// Scoring knobs for [`HtmlKb::search`].
///
/// The defaults were chosen empirically against the production corpus:
/// a chunk tagged with a different fund is demoted rather than filtered
/// (cross-fund contact and blurb chunks carry no fund at all and must stay
/// rankable), and a tier match gets a gentle boost so tiered benefits rise
/// within the right fund.
#[derive(Clone, Copy, Debug)]
pub struct RetrieverTuning {
    /// Multiplier when the query names a fund and the chunk names a
    /// different one.
    pub hmo_mismatch_penalty: f32,
    /// Multiplier when the query names a tier listed in the chunk's tags.
    pub tier_match_boost: f32,
}

impl Default for RetrieverTuning {
    fn default() -> Self {
        Self {
            hmo_mismatch_penalty: 0.75,
            tier_match_boost: 1.08,
        }
    }
}

/// Construction-time configuration for [`HtmlKb`].
#[derive(Clone, Debug)]
pub struct KbConfig {
    /// Root directory scanned recursively for `.html` sources.
    pub kb_dir: PathBuf,
    /// Directory holding `kb_<fingerprint>.bin` cache artifacts.
    pub cache_dir: PathBuf,
    /// Embeddings deployment identifier, baked into the fingerprint.
    pub embeddings_deployment: String,
    /// Texts per embedding request.
    pub batch_size: usize,
    pub tuning: RetrieverTuning,
}

impl KbConfig {
    #[must_use]
    pub fn new(
        kb_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        embeddings_deployment: impl Into<String>,
    ) -> Self {
        Self {
            kb_dir: kb_dir.into(),
            cache_dir: cache_dir.into(),
            embeddings_deployment: embeddings_deployment.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            tuning: RetrieverTuning::default(),
        }
    }

    /// Loads `KB_DIR`, `CACHE_DIR`, and `EMBEDDINGS_DEPLOYMENT` from the
    /// environment (reading `.env` first when present).
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::new(
            std::env::var("KB_DIR").unwrap_or_else(|_| "kb_html".to_string()),
            std::env::var("CACHE_DIR").unwrap_or_else(|_| ".kb_cache".to_string()),
            std::env::var("EMBEDDINGS_DEPLOYMENT")
                .unwrap_or_else(|_| "text-embedding-ada-002".to_string()),
        )
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: RetrieverTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

/// Immutable embedded index over the benefits documents.
///
/// Construction either loads a fingerprint-matched cache or rebuilds from
/// the sources; after that the index never changes and can be shared by
/// reference across concurrent searches. A directory change means a new
/// fingerprint, handled by constructing a fresh instance.
pub struct HtmlKb {
    chunks: Vec<KbChunk>,
    vectors: Vec<Vec<f32>>,
    fingerprint: String,
    embedder: Arc<dyn EmbeddingsClient>,
    batch_size: usize,
    tuning: RetrieverTuning,
}

impl HtmlKb {
    /// Builds or loads the index.
    ///
    /// Per-file read failures are logged and skipped; an embedding failure
    /// (after the client's retries) aborts construction and leaves no
    /// partial cache behind.
    pub async fn open(
        cfg: KbConfig,
        embedder: Arc<dyn EmbeddingsClient>,
    ) -> Result<Self, KbError> {
        let manifest = scan_manifest(&cfg.kb_dir);
        let fp = fingerprint(CACHE_VERSION, &cfg.embeddings_deployment, &manifest);
        let cache_file = cache_path(&cfg.cache_dir, &fp);

        if cache_file.exists() {
            match load_cache(&cache_file).await {
                Ok(payload)
                    if payload.version == CACHE_VERSION
                        && payload.embeddings_deployment == cfg.embeddings_deployment =>
                {
                    info!(
                        fingerprint = %fp,
                        chunks = payload.chunks.len(),
                        "loaded knowledge base from cache"
                    );
                    return Ok(Self {
                        chunks: payload.chunks,
                        vectors: payload.vectors,
                        fingerprint: fp,
                        embedder,
                        batch_size: cfg.batch_size,
                        tuning: cfg.tuning,
                    });
                }
                Ok(_) => {
                    warn!(path = %cache_file.display(), "cache version/deployment mismatch, rebuilding");
                    tokio::fs::remove_file(&cache_file).await?;
                }
                Err(err) => {
                    warn!(path = %cache_file.display(), error = %err, "unreadable cache, rebuilding");
                    tokio::fs::remove_file(&cache_file).await?;
                }
            }
        }

        let mut chunks: Vec<KbChunk> = Vec::new();
        for entry in &manifest {
            match tokio::fs::read_to_string(&entry.path).await {
                Ok(html) => chunks.extend(extract_chunks(&entry.path, &html)),
                Err(err) => {
                    warn!(path = %entry.path, error = %err, "skipping unreadable source file");
                }
            }
        }

        let vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            let payloads: Vec<String> = chunks.iter().map(KbChunk::embedding_payload).collect();
            embedder.embed_texts(&payloads, cfg.batch_size).await?
        };

        let payload = CachePayload {
            version: CACHE_VERSION.to_string(),
            embeddings_deployment: cfg.embeddings_deployment.clone(),
            manifest,
            chunks,
            vectors,
        };
        store_cache(&cache_file, &payload).await?;
        info!(
            fingerprint = %fp,
            chunks = payload.chunks.len(),
            "built knowledge base and wrote cache"
        );

        Ok(Self {
            chunks: payload.chunks,
            vectors: payload.vectors,
            fingerprint: fp,
            embedder,
            batch_size: cfg.batch_size,
            tuning: cfg.tuning,
        })
    }

    /// Assembles an index directly from parts, bypassing the file system.
    /// Used by evaluation harnesses and tests that need synthetic vectors.
    #[must_use]
    pub fn from_parts(
        chunks: Vec<KbChunk>,
        vectors: Vec<Vec<f32>>,
        embedder: Arc<dyn EmbeddingsClient>,
    ) -> Self {
        Self {
            chunks,
            vectors,
            fingerprint: String::new(),
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            tuning: RetrieverTuning::default(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: RetrieverTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// The build fingerprint (empty for [`HtmlKb::from_parts`] indexes).
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn chunks(&self) -> &[KbChunk] {
        &self.chunks
    }

    /// Top-k retrieval with fund/tier biasing.
    ///
    /// The query is embedded once; every chunk is scored by cosine
    /// similarity, demoted when its fund contradicts `hmo`, and boosted when
    /// `tier` appears in its tags. Ties keep insertion order. An empty index
    /// returns an empty list without calling the embedder.
    pub async fn search(
        &self,
        query: &str,
        hmo: Option<Hmo>,
        tier: Option<Tier>,
        top_k: usize,
    ) -> Result<Vec<KbChunk>, KbError> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_texts = [query.to_string()];
        let query_vectors = self
            .embedder
            .embed_texts(&query_texts, self.batch_size)
            .await?;
        let Some(query_vector) = query_vectors.first() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &KbChunk)> = self
            .vectors
            .iter()
            .zip(&self.chunks)
            .map(|(vector, chunk)| {
                let mut score = cosine(query_vector, vector);
                if let (Some(wanted), Some(tagged)) = (hmo, chunk.hmo) {
                    if wanted != tagged {
                        score *= self.tuning.hmo_mismatch_penalty;
                    }
                }
                if let Some(wanted) = tier {
                    if chunk.tier_tags.contains(&wanted) {
                        score *= self.tuning.tier_match_boost;
                    }
                }
                (score, chunk)
            })
            .collect();

        // Stable sort keeps original order for equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    let norm_a = if norm_a == 0.0 { 1.0 } else { norm_a };
    let norm_b = if norm_b == 0.0 { 1.0 } else { norm_b };
    dot / (norm_a * norm_b)
}
