//! Transitive import resolution.
//!
//! Starting from a root document, every import edge found anywhere in a
//! parsed document is followed depth-first, strictly one document at a time.
//! A visited set keyed by normalized URL guarantees termination on cycles.
//! A failing import is logged and skipped; only a failing root is an error.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::adapters::{Candidate, FetchContext, ParsedOntology, SourceAdapter};
use crate::error::OntologyResult;
use crate::rules::Named;

/// How to resolve the same name defined by several documents in a closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the definition seen first in visit order.
    #[default]
    FirstWins,
    /// Later definitions replace earlier ones in place.
    LastWins,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::FirstWins => "first_wins",
            DuplicatePolicy::LastWins => "last_wins",
        }
    }
}

/// The union of a root document and everything it transitively imports.
#[derive(Debug, Clone, Default)]
pub struct ImportClosure {
    pub ontology: ParsedOntology,
    /// Successfully loaded documents, in visit order (root first).
    pub visited: Vec<String>,
    /// Imports that could not be loaded, with the reason.
    pub failed: Vec<(String, String)>,
    /// Definitions dropped or replaced under the duplicate policy.
    pub duplicates: usize,
}

/// Canonical form of a document URL for the visited set.
///
/// Scheme and host are lowercased, the fragment is dropped, and trailing
/// `/` and `#` are trimmed. Non-URLs (local paths) are only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let normalized = match url::Url::parse(raw) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => raw.to_string(),
    };
    normalized.trim_end_matches(['/', '#']).to_string()
}

/// Accumulates documents into one `ParsedOntology` under a duplicate policy.
struct Accumulator {
    policy: DuplicatePolicy,
    ontology: ParsedOntology,
    entity_index: HashMap<String, usize>,
    relationship_index: HashMap<String, usize>,
    duplicates: usize,
}

impl Accumulator {
    fn new(root_url: &str, base_uri: &str, policy: DuplicatePolicy) -> Self {
        let mut ontology = ParsedOntology::empty(root_url);
        ontology.base_uri = base_uri.to_string();
        Self {
            policy,
            ontology,
            entity_index: HashMap::new(),
            relationship_index: HashMap::new(),
            duplicates: 0,
        }
    }

    fn add(&mut self, document: ParsedOntology) {
        let policy = self.policy;
        self.duplicates += merge_into(
            &mut self.ontology.entities,
            &mut self.entity_index,
            document.entities,
            policy,
        );
        self.duplicates += merge_into(
            &mut self.ontology.relationships,
            &mut self.relationship_index,
            document.relationships,
            policy,
        );
        for import in document.imports {
            if !self.ontology.imports.contains(&import) {
                self.ontology.imports.push(import);
            }
        }
        self.ontology.documents.extend(document.documents);
    }
}

fn merge_into<T: Named>(
    target: &mut Vec<Candidate<T>>,
    index: &mut HashMap<String, usize>,
    incoming: Vec<Candidate<T>>,
    policy: DuplicatePolicy,
) -> usize {
    let mut duplicates = 0;
    for candidate in incoming {
        let key = candidate.item.key();
        match index.get(&key) {
            Some(&i) => {
                duplicates += 1;
                if policy == DuplicatePolicy::LastWins {
                    target[i] = candidate;
                }
            }
            None => {
                index.insert(key, target.len());
                target.push(candidate);
            }
        }
    }
    duplicates
}

/// Follows import edges from a root document.
pub struct ImportResolver<'a> {
    adapter: &'a dyn SourceAdapter,
    ctx: &'a FetchContext,
    policy: DuplicatePolicy,
}

impl<'a> ImportResolver<'a> {
    pub fn new(adapter: &'a dyn SourceAdapter, ctx: &'a FetchContext, policy: DuplicatePolicy) -> Self {
        Self {
            adapter,
            ctx,
            policy,
        }
    }

    async fn load(&self, url: &str) -> OntologyResult<ParsedOntology> {
        let text = self.adapter.fetch(self.ctx, url).await?;
        self.adapter.parse(&text, url)
    }

    /// Load the root and its transitive imports, depth-first pre-order.
    #[instrument(skip(self))]
    pub async fn parse_with_imports(&self, root_url: &str) -> OntologyResult<ImportClosure> {
        let root = self.load(root_url).await?;

        let mut visited_keys: HashSet<String> = HashSet::new();
        visited_keys.insert(normalize_url(root_url));
        let mut visited = vec![root_url.to_string()];
        let mut failed = Vec::new();

        let mut stack: Vec<String> = root.imports.iter().rev().cloned().collect();
        let mut acc = Accumulator::new(root_url, &root.base_uri, self.policy);
        acc.add(root);

        while let Some(url) = stack.pop() {
            if !visited_keys.insert(normalize_url(&url)) {
                continue;
            }

            match self.load(&url).await {
                Ok(document) => {
                    info!(
                        "Import {}: {} entities, {} relationships",
                        url,
                        document.entities.len(),
                        document.relationships.len()
                    );
                    stack.extend(
                        document
                            .imports
                            .iter()
                            .rev()
                            .filter(|i| !visited_keys.contains(&normalize_url(i)))
                            .cloned(),
                    );
                    acc.add(document);
                    visited.push(url);
                }
                Err(e) => {
                    warn!("Skipping import {}: {}", url, e);
                    failed.push((url, e.to_string()));
                }
            }
        }

        if acc.duplicates > 0 {
            info!(
                "Resolved {} duplicate definitions across the closure ({})",
                acc.duplicates,
                self.policy.as_str()
            );
        }

        Ok(ImportClosure {
            ontology: acc.ontology,
            visited,
            failed,
            duplicates: acc.duplicates,
        })
    }
}
