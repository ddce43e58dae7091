//! Source adapters: fetch a document and turn it into candidate entities and
//! relationships.
//!
//! This module provides:
//! - `SourceAdapter` trait that every source format implements
//! - `AdapterRegistry` for picking the adapter for a configured source
//! - `FetchContext` + `fetch_document`, the shared local/cached/remote fetch
//!
//! # Adding a New Adapter
//!
//! 1. Create a new file in `adapters/` implementing `SourceAdapter`
//! 2. Register it in `AdapterRegistry::with_builtin()`

mod json;
mod owl;

pub use json::JsonAdapter;
pub use owl::OwlAdapter;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use ontoforge_graph::{Entity, Relationship, SourceInfo, SourceType};
use ontoforge_ingest::{DocumentCache, OntologyFamily};

use crate::config::{FetchSettings, Rule};
use crate::error::{OntologyError, OntologyResult};
use crate::rules::{RuleEngine, Selection};

/// `Accept` header favouring RDF serializations.
pub const RDF_ACCEPT: &str =
    "application/rdf+xml, text/turtle;q=0.9, application/ld+json;q=0.8, application/json;q=0.8, */*;q=0.5";

const USER_AGENT: &str = concat!("ontoforge/", env!("CARGO_PKG_VERSION"));

/// An extracted item with the provenance rules filter on.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub item: T,
    /// Full URI of the declaration; namespace keywords are matched here.
    pub uri: String,
    /// Declaring kind, e.g. `owl:Class` or a JSON container path.
    pub kind: String,
}

impl<T> Candidate<T> {
    pub fn new(item: T, uri: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            item,
            uri: uri.into(),
            kind: kind.into(),
        }
    }
}

pub type EntityCandidate = Candidate<Entity>;
pub type RelationshipCandidate = Candidate<Relationship>;

/// Everything extracted from one document, or from a whole import closure.
#[derive(Debug, Clone, Default)]
pub struct ParsedOntology {
    pub url: String,
    pub base_uri: String,
    pub entities: Vec<EntityCandidate>,
    pub relationships: Vec<RelationshipCandidate>,
    /// Absolute URIs of imported documents, in document order.
    pub imports: Vec<String>,
    /// Raw JSON documents for path-based rules (JSON sources only).
    pub documents: Vec<Value>,
}

impl ParsedOntology {
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            base_uri: url.to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|c| c.item.name.clone()).collect()
    }
}

/// Trait that all source adapters must implement.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter identifier (e.g., "owl", "json").
    fn name(&self) -> &'static str;

    /// Whether this adapter parses the given configured source type.
    fn handles_type(&self, kind: SourceType) -> bool;

    /// Whether this adapter recognises the URL by extension or pattern.
    fn can_handle(&self, url: &str) -> bool;

    /// Fetch the raw document text.
    async fn fetch(&self, ctx: &FetchContext, url: &str) -> OntologyResult<String> {
        fetch_document(ctx, url, CacheNamespace::Ontology(OntologyFamily::detect(url))).await
    }

    /// Parse document text into candidates.
    fn parse(&self, text: &str, url: &str) -> OntologyResult<ParsedOntology>;

    /// Apply an entity rule to parsed candidates.
    fn extract_entities(
        &self,
        engine: &RuleEngine,
        rule: &Rule,
        parsed: &ParsedOntology,
    ) -> Selection<Entity> {
        engine.select(rule, &parsed.entities)
    }

    /// Apply a relationship rule to parsed candidates.
    fn extract_relationships(
        &self,
        engine: &RuleEngine,
        rule: &Rule,
        parsed: &ParsedOntology,
    ) -> Selection<Relationship> {
        engine.select(rule, &parsed.relationships)
    }
}

/// Registry of available adapters.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Registry with the OWL/RDF and JSON adapters.
    pub fn with_builtin() -> Self {
        Self {
            adapters: vec![Arc::new(OwlAdapter), Arc::new(JsonAdapter)],
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    /// Pick the adapter for a source: declared type first, then URL pattern.
    pub fn for_source(&self, source: &SourceInfo) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.handles_type(source.kind))
            .or_else(|| self.adapters.iter().find(|a| a.can_handle(&source.url)))
            .cloned()
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Which cache tree a remote document belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Ontology(OntologyFamily),
    Dataset,
}

/// Shared resources for fetching documents.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub http_client: reqwest::Client,
    /// `None` disables the content cache.
    pub cache: Option<DocumentCache>,
}

impl FetchContext {
    pub fn new(settings: &FetchSettings, cache: Option<DocumentCache>) -> OntologyResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(Policy::limited(settings.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OntologyError::fetch("<http client>", None, e.to_string()))?;
        Ok(Self { http_client, cache })
    }

    pub fn cache_path(&self, url: &str, namespace: CacheNamespace) -> Option<PathBuf> {
        let cache = self.cache.as_ref()?;
        Some(match namespace {
            CacheNamespace::Ontology(family) => cache.ontology_path(url, family),
            CacheNamespace::Dataset => cache.dataset_path(url),
        })
    }
}

/// True for `http` and `https` URLs.
pub fn is_remote(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Fetch a document: local paths directly, remote URLs through the cache.
#[instrument(skip(ctx))]
pub async fn fetch_document(
    ctx: &FetchContext,
    url: &str,
    namespace: CacheNamespace,
) -> OntologyResult<String> {
    if !is_remote(url) {
        return read_local(url).await;
    }

    let cache_path = ctx.cache_path(url, namespace);
    if let (Some(cache), Some(path)) = (ctx.cache.as_ref(), cache_path.as_ref()) {
        match cache.read(path).await {
            Ok(Some(text)) => return Ok(text),
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache entry for {}: {:#}", url, e),
        }
    }

    let response = get_with_backoff(&ctx.http_client, url).await?;
    let text = response
        .text()
        .await
        .map_err(|e| OntologyError::fetch(url, None, e.to_string()))?;
    info!("Fetched {} ({} bytes)", url, text.len());

    if let (Some(cache), Some(path)) = (ctx.cache.as_ref(), cache_path.as_ref()) {
        if let Err(e) = cache.write(path, &text).await {
            warn!("Failed to cache {}: {:#}", url, e);
        }
    }

    Ok(text)
}

async fn read_local(url: &str) -> OntologyResult<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed
            .to_file_path()
            .map_err(|_| OntologyError::fetch(url, None, "invalid file URL"))?,
        _ => PathBuf::from(url),
    };

    match tokio::fs::read_to_string(&path).await {
        Ok(text) => {
            debug!("Read local document {:?} ({} bytes)", path, text.len());
            Ok(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OntologyError::fetch(url, None, "file not found"))
        }
        Err(e) => Err(OntologyError::fetch(url, None, e.to_string())),
    }
}

/// GET with a short backoff on rate limiting and server errors.
///
/// Any other non-success status fails immediately with the status attached.
async fn get_with_backoff(client: &reqwest::Client, url: &str) -> OntologyResult<reqwest::Response> {
    let mut retries = 0;
    let mut delay = Duration::from_millis(500);
    let max_retries = 2;

    loop {
        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, RDF_ACCEPT)
            .send()
            .await
            .map_err(|e| OntologyError::fetch(url, e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if (status.as_u16() == 429 || status.is_server_error()) && retries < max_retries {
            let wait = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(delay);
            warn!("{}: HTTP {}, retrying in {:?}", url, status, wait);
            tokio::time::sleep(wait).await;
            retries += 1;
            delay *= 2;
            continue;
        }

        let reason = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        return Err(OntologyError::fetch(url, Some(status.as_u16()), reason));
    }
}
