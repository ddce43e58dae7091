//! On-disk content cache for fetched documents.
//!
//! Layout under the cache root:
//!
//! ```text
//! ontologies/<family>/<host>/<path segments...>/@document
//! datasets/<host>/<path segments...>/@document
//! ```
//!
//! Keys are derived from the URL: protocol stripped, each path segment
//! sanitized to a filesystem-safe form. Every key segment is a directory and
//! the content lives in a fixed leaf file, so `onto/core` and
//! `onto/core/extra.owl` can both be cached. Content for a URL is treated as
//! immutable once cached, so concurrent writers simply race and the last one
//! wins. Writes are not transactional; an interrupted write can leave a
//! truncated file behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::family::OntologyFamily;

static PROTOCOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid protocol regex"));

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid unsafe-char regex"));

const ONTOLOGY_DIR: &str = "ontologies";
const DATASET_DIR: &str = "datasets";
const INDEX_SEGMENT: &str = "index";
/// Leaf file holding a cached document. Sanitized segments never contain `@`.
const DOCUMENT_FILE: &str = "@document";

/// Derive filesystem-safe path segments from a URL.
///
/// The query string is folded into the last segment; an empty last segment
/// (trailing slash) becomes `index`.
pub fn cache_key(url: &str) -> Vec<String> {
    let without_protocol = PROTOCOL.replace(url.trim(), "");
    let without_fragment = without_protocol
        .split('#')
        .next()
        .unwrap_or_default();
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    let mut raw: Vec<&str> = path.split('/').collect();
    // Drop empty segments in the middle (`a//b`) but remember a trailing slash
    let trailing_slash = raw.len() > 1 && raw.last().is_some_and(|s| s.is_empty());
    raw.retain(|s| !s.is_empty());

    let mut segments: Vec<String> = raw.into_iter().map(sanitize_segment).collect();
    if trailing_slash || segments.len() <= 1 {
        segments.push(INDEX_SEGMENT.to_string());
    }

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        if let Some(last) = segments.last_mut() {
            last.push('_');
            last.push_str(&sanitize_segment(query));
        }
    }

    segments
}

/// Replace anything outside `[A-Za-z0-9._-]` and neutralize dot-only names.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(segment, "_");
    if cleaned.chars().all(|c| c == '.') {
        return "_".repeat(cleaned.len().max(1));
    }
    cleaned.into_owned()
}

/// Filesystem cache of fetched ontology and dataset documents.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    root: PathBuf,
}

impl DocumentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache path for an ontology document, namespaced by family.
    pub fn ontology_path(&self, url: &str, family: OntologyFamily) -> PathBuf {
        let dir = self
            .root
            .join(ONTOLOGY_DIR)
            .join(slug::slugify(family.as_str()));
        document_path(dir, url)
    }

    /// Cache path for a dataset document.
    pub fn dataset_path(&self, url: &str) -> PathBuf {
        document_path(self.root.join(DATASET_DIR), url)
    }

    /// Read a cached document, or `None` if it was never written.
    #[instrument(skip(self))]
    pub async fn read(&self, path: &Path) -> Result<Option<String>> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read cached document: {:?}", path))?;
        debug!("Cache hit: {:?}", path);
        Ok(Some(content))
    }

    /// Persist a document, creating parent directories as needed.
    #[instrument(skip(self, content))]
    pub async fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create cache directory: {:?}", parent))?;
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("failed to write cached document: {:?}", path))?;
        debug!("Cached {} bytes at {:?}", content.len(), path);
        Ok(())
    }
}

fn document_path(mut dir: PathBuf, url: &str) -> PathBuf {
    dir.extend(cache_key(url));
    dir.push(DOCUMENT_FILE);
    dir
}
