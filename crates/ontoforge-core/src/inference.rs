//! Recovery of missing relationship endpoints from definition text.
//!
//! A bounded heuristic over the document's own entity vocabulary: every
//! known name is matched case-insensitively on word boundaries, matches are
//! ordered by first occurrence, and the first two distinct names become
//! source and target.

use regex::Regex;
use tracing::debug;

use ontoforge_graph::{Relationship, PLACEHOLDER_ENTITY};

/// Matches known entity names in free text.
///
/// Build it only once the document's full entity list is known.
pub struct RelationshipInferencer {
    patterns: Vec<(String, Regex)>,
}

impl RelationshipInferencer {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                if name.is_empty() {
                    return None;
                }
                // Explicit non-word anchors so names like `C++` still match
                let pattern = format!(r"(?i)(?:^|\W)({})(?:\W|$)", regex::escape(name));
                Regex::new(&pattern).ok().map(|re| (name.to_string(), re))
            })
            .collect();
        Self { patterns }
    }

    /// Known names occurring in `text`, ordered by first offset.
    pub fn mentions(&self, text: &str) -> Vec<String> {
        let mut found: Vec<(usize, &str)> = self
            .patterns
            .iter()
            .filter_map(|(name, re)| {
                re.captures(text)
                    .and_then(|c| c.get(1))
                    .map(|m| (m.start(), name.as_str()))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let mut names: Vec<String> = Vec::new();
        for (_, name) in found {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Fill an empty `source` and/or `target` from `definition`.
    ///
    /// Explicit endpoints are never overwritten. Sides that cannot be
    /// inferred get the placeholder entity. Returns true if anything changed.
    pub fn infer(&self, relationship: &mut Relationship, definition: &str) -> bool {
        let missing_source = relationship.source.is_empty();
        let missing_target = relationship.target.is_empty();
        if !missing_source && !missing_target {
            return false;
        }

        let mentions = self.mentions(definition);
        let explicit = if missing_source {
            relationship.target.clone()
        } else {
            relationship.source.clone()
        };
        let mut remaining = mentions
            .iter()
            .filter(|name| explicit.is_empty() || **name != explicit);

        if missing_source {
            relationship.source = remaining
                .next()
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_ENTITY.to_string());
        }
        if missing_target {
            relationship.target = remaining
                .next()
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_ENTITY.to_string());
        }

        debug!(
            "Inferred {} -> {} for {} from {} mention(s)",
            relationship.source,
            relationship.target,
            relationship.name,
            mentions.len()
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_two_mentions_in_order() {
        let inferencer = RelationshipInferencer::new(["Buyer", "Supplier", "Contract"]);
        let mut rel = Relationship::new("negotiates", "", "");

        assert!(inferencer.infer(
            &mut rel,
            "The Buyer and Supplier negotiate the terms of a Contract."
        ));

        assert_eq!(rel.source, "Buyer");
        assert_eq!(rel.target, "Supplier");
    }

    #[test]
    fn test_word_boundaries_and_case() {
        let inferencer = RelationshipInferencer::new(["Order", "Account"]);
        // "Ordering" must not match "Order"
        assert_eq!(inferencer.mentions("Ordering from an ACCOUNT"), vec!["Account"]);
        assert_eq!(
            inferencer.mentions("the account holds an order for the account"),
            vec!["Account", "Order"]
        );
    }

    #[test]
    fn test_names_with_non_word_edges() {
        let inferencer = RelationshipInferencer::new(["C++", "Module", ".NET"]);
        assert_eq!(
            inferencer.mentions("A .NET assembly wraps a C++ Module."),
            vec![".NET", "C++", "Module"]
        );
        assert!(inferencer.mentions("C++11 modules").is_empty());
    }

    #[test]
    fn test_missing_sides_get_placeholder() {
        let inferencer = RelationshipInferencer::new(["Person"]);

        let mut one = Relationship::new("knows", "", "");
        inferencer.infer(&mut one, "A Person knows someone.");
        assert_eq!(one.source, "Person");
        assert_eq!(one.target, PLACEHOLDER_ENTITY);

        let mut none = Relationship::new("relates", "", "");
        inferencer.infer(&mut none, "");
        assert_eq!(none.source, PLACEHOLDER_ENTITY);
        assert_eq!(none.target, PLACEHOLDER_ENTITY);
    }

    #[test]
    fn test_explicit_endpoint_is_kept() {
        let inferencer = RelationshipInferencer::new(["Buyer", "Supplier", "Contract"]);

        let mut rel = Relationship::new("signs", "Supplier", "");
        inferencer.infer(&mut rel, "The Supplier signs a Contract with the Buyer.");
        assert_eq!(rel.source, "Supplier");
        assert_eq!(rel.target, "Contract");

        let mut full = Relationship::new("signs", "Buyer", "Contract");
        assert!(!inferencer.infer(&mut full, "Supplier Supplier"));
        assert_eq!(full.source, "Buyer");
    }
}
