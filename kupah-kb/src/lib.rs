//! HTML knowledge base for Israeli HMO benefits documents.
//!
//! ```text
//! KB directory ──► cache::scan_manifest ──► fingerprint
//!                                               │
//!                        cache hit ◄────────────┤
//!                            │                  ▼
//!                            │        parse::extract_chunks (per file)
//!                            │                  │
//!                            │        EmbeddingsClient::embed_texts
//!                            │                  │
//!                            └───────► HtmlKb { chunks, vectors }
//!                                               │
//!                                       HtmlKb::search (cosine + biases)
//! ```
//!
//! Each `.html` source is decomposed into atomic [`KbChunk`] records (one
//! fact per service × HMO × membership tier), embedded once, and persisted
//! under a fingerprint derived from the source manifest so unchanged
//! directories never re-embed.

pub mod cache;
pub mod chunk;
pub mod error;
pub mod kb;
pub mod parse;

pub use chunk::{ChunkKind, KbChunk};
pub use error::KbError;
pub use kb::{HtmlKb, KbConfig, RetrieverTuning};
