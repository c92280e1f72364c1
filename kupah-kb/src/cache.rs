//! Source manifest, build fingerprint, and the on-disk embedding cache.
//!
//! A build is identified by a short digest over the cache schema version,
//! the embeddings deployment, and every source file's `(path, size,
//! mtime_ns)` row in path order. The digest is the cache file stem, so an
//! unchanged directory maps to an existing cache file and skips parsing and
//! embedding entirely.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::chunk::KbChunk;
use crate::error::KbError;

/// Bump when the chunk schema or payload layout changes; a mismatch forces
/// a rebuild.
pub const CACHE_VERSION: &str = "2";

/// One scanned source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Absolute path.
    pub path: String,
    pub size: u64,
    pub mtime_ns: u128,
}

/// The serialized cache payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachePayload {
    pub version: String,
    pub embeddings_deployment: String,
    pub manifest: Vec<ManifestEntry>,
    pub chunks: Vec<KbChunk>,
    pub vectors: Vec<Vec<f32>>,
}

/// Recursively scans `kb_dir` for `.html` files, in path order.
///
/// A missing directory yields an empty manifest; the build then succeeds
/// with an empty index. Files that cannot be stat'ed are skipped.
#[must_use]
pub fn scan_manifest(kb_dir: &Path) -> Vec<ManifestEntry> {
    let mut entries: Vec<ManifestEntry> = WalkDir::new(kb_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            let path = std::path::absolute(e.path()).ok()?;
            let mtime_ns = meta
                .modified()
                .ok()?
                .duration_since(std::time::UNIX_EPOCH)
                .ok()?
                .as_nanos();
            Some(ManifestEntry {
                path: path.to_string_lossy().into_owned(),
                size: meta.len(),
                mtime_ns,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

/// Short hex digest identifying one KB build.
#[must_use]
pub fn fingerprint(version: &str, deployment: &str, manifest: &[ManifestEntry]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("ver:{version}\n"));
    hasher.update(format!("deploy:{deployment}\n"));
    for entry in manifest {
        hasher.update(format!("{}|{}|{}\n", entry.path, entry.size, entry.mtime_ns));
    }

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Cache file path for a fingerprint.
#[must_use]
pub fn cache_path(cache_dir: &Path, fp: &str) -> PathBuf {
    cache_dir.join(format!("kb_{fp}.bin"))
}

/// Reads and decodes a cache file.
pub async fn load_cache(path: &Path) -> Result<CachePayload, KbError> {
    let bytes = tokio::fs::read(path).await?;
    bincode::deserialize(&bytes).map_err(|err| KbError::Cache {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Encodes and writes a cache file.
pub async fn store_cache(path: &Path, payload: &CachePayload) -> Result<(), KbError> {
    let bytes = bincode::serialize(payload).map_err(|err| KbError::Cache {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkKind;
    use tempfile::tempdir;

    #[test]
    fn missing_directory_yields_empty_manifest() {
        let manifest = scan_manifest(Path::new("/definitely/not/here"));
        assert!(manifest.is_empty());
    }

    #[test]
    fn manifest_is_sorted_and_html_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.html"), "<p>ב</p>").unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>א</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.HTML"), "<p>ג</p>").unwrap();

        let manifest = scan_manifest(dir.path());
        assert_eq!(manifest.len(), 3);
        let paths: Vec<&str> = manifest.iter().map(|m| m.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort_unstable();
        assert_eq!(paths, sorted);
        assert!(manifest.iter().all(|m| m.size > 0));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let manifest = vec![ManifestEntry {
            path: "/kb/a.html".into(),
            size: 10,
            mtime_ns: 1_700_000_000_000_000_000,
        }];
        let a = fingerprint(CACHE_VERSION, "text-embedding-ada-002", &manifest);
        let b = fingerprint(CACHE_VERSION, "text-embedding-ada-002", &manifest);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);

        let other_deploy = fingerprint(CACHE_VERSION, "text-embedding-3-large", &manifest);
        assert_ne!(a, other_deploy);

        let mut touched = manifest.clone();
        touched[0].mtime_ns += 1;
        assert_ne!(a, fingerprint(CACHE_VERSION, "text-embedding-ada-002", &touched));
    }

    #[tokio::test]
    async fn cache_round_trip_is_byte_identical() {
        let dir = tempdir().unwrap();
        let payload = CachePayload {
            version: CACHE_VERSION.to_string(),
            embeddings_deployment: "text-embedding-ada-002".into(),
            manifest: vec![],
            chunks: vec![KbChunk {
                text: "90% הנחה".into(),
                source_uri: "file:///kb/a.html#t1_1".into(),
                hmo: Some(kupah_core::Hmo::Maccabi),
                tier_tags: vec![kupah_core::Tier::Gold],
                section: Some("בדיקות".into()),
                service: Some("ייעוץ".into()),
                kind: ChunkKind::Benefit,
            }],
            vectors: vec![vec![0.25, -0.5, 1.0]],
        };

        let path = cache_path(dir.path(), "abcd1234abcd1234");
        store_cache(&path, &payload).await.unwrap();
        let first_bytes = std::fs::read(&path).unwrap();

        let loaded = load_cache(&path).await.unwrap();
        assert_eq!(loaded, payload);

        store_cache(&path, &loaded).await.unwrap();
        let second_bytes = std::fs::read(&path).unwrap();
        assert_eq!(first_bytes, second_bytes);
    }

    #[tokio::test]
    async fn corrupt_cache_reports_cache_error() {
        let dir = tempdir().unwrap();
        let path = cache_path(dir.path(), "feedfacefeedface");
        std::fs::write(&path, b"not a cache").unwrap();
        let err = load_cache(&path).await.unwrap_err();
        assert!(matches!(err, KbError::Cache { .. }));
    }
}
