//! Declarative inclusion rules, applied per ontology family.
//!
//! A candidate is kept when:
//! - its declaring kind is listed in the rule's `path` (`*` or empty keeps all)
//! - its URI contains one of the namespace keywords (the rule's own list,
//!   else the family defaults; no keywords keeps all)
//! - no earlier candidate had the same key

use std::collections::HashSet;

use ontoforge_graph::{Entity, Relationship};
use ontoforge_ingest::OntologyFamily;

use crate::adapters::Candidate;
use crate::config::Rule;

/// Items the rule engine can deduplicate.
pub trait Named {
    fn name(&self) -> &str;

    /// Identity used for deduplication.
    fn key(&self) -> String {
        self.name().to_string()
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Relationship {
    fn name(&self) -> &str {
        &self.name
    }

    // The same property name may connect different pairs
    fn key(&self) -> String {
        format!("{}|{}|{}", self.name, self.source, self.target)
    }
}

/// Outcome of applying a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    pub kept: Vec<T>,
    /// Names rejected by the kind or namespace filter.
    pub filtered: Vec<String>,
    /// How many duplicates were dropped.
    pub duplicates: usize,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            kept: Vec::new(),
            filtered: Vec::new(),
            duplicates: 0,
        }
    }
}

/// Applies rules with a family's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleEngine {
    family: OntologyFamily,
}

impl RuleEngine {
    pub fn for_family(family: OntologyFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> OntologyFamily {
        self.family
    }

    /// Namespace keywords in effect for `rule`, lowercased.
    pub fn namespace_keywords(&self, rule: &Rule) -> Vec<String> {
        if rule.namespaces.is_empty() {
            self.family
                .namespace_keywords()
                .iter()
                .map(|k| k.to_lowercase())
                .collect()
        } else {
            rule.namespaces.iter().map(|k| k.to_lowercase()).collect()
        }
    }

    /// Declaring kinds listed in `rule.path`; `None` means all kinds.
    pub fn kinds(rule: &Rule) -> Option<Vec<&str>> {
        let kinds: Vec<&str> = rule
            .path
            .split('|')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        if kinds.is_empty() || kinds.contains(&"*") {
            None
        } else {
            Some(kinds)
        }
    }

    /// Filter and deduplicate candidates. Input order is preserved.
    pub fn select<T: Named + Clone>(&self, rule: &Rule, candidates: &[Candidate<T>]) -> Selection<T> {
        let kinds = Self::kinds(rule);
        let keywords = self.namespace_keywords(rule);
        let mut seen = HashSet::new();
        let mut selection = Selection::default();

        for candidate in candidates {
            let kind_ok = kinds
                .as_ref()
                .map_or(true, |kinds| kinds.contains(&candidate.kind.as_str()));
            let uri = candidate.uri.to_lowercase();
            let namespace_ok = keywords.is_empty() || keywords.iter().any(|k| uri.contains(k));

            if !(kind_ok && namespace_ok) {
                selection.filtered.push(candidate.item.name().to_string());
                continue;
            }
            if !seen.insert(candidate.item.key()) {
                selection.duplicates += 1;
                continue;
            }
            selection.kept.push(candidate.item.clone());
        }

        selection
    }
}
