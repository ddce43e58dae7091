//! Lossy `{e, r}` projection of a source ontology.

use std::collections::HashSet;

use crate::schema::{CompactOntology, SourceOntology};

/// Placeholder or upper-ontology names that carry no domain meaning.
pub const GENERIC_ENTITIES: &[&str] = &[
    "Thing", "Entity", "Resource", "Class", "Object", "Concept", "Node", "Item",
];

/// Relationship types too vague to be useful downstream.
pub const GENERIC_RELATIONSHIP_TYPES: &[&str] = &[
    "relatedTo",
    "isRelatedTo",
    "hasProperty",
    "associatedWith",
    "seeAlso",
    "sameAs",
    "type",
    "subClassOf",
];

/// Project an ontology to entity names and `[source, type, target]` triples.
///
/// Drops generic entities, edges touching them, self-loops, and edges with an
/// empty or generic type. Never use the result as the canonical artifact.
pub fn compact(ontology: &SourceOntology) -> CompactOntology {
    let generic: HashSet<&str> = GENERIC_ENTITIES.iter().copied().collect();

    let e = ontology
        .entities
        .iter()
        .map(|entity| entity.name.clone())
        .filter(|name| !generic.contains(name.as_str()))
        .collect();

    let r = ontology
        .relationships
        .iter()
        .filter(|rel| {
            let kind = rel.name.trim();
            !kind.is_empty()
                && !GENERIC_RELATIONSHIP_TYPES.contains(&kind)
                && !rel.is_self_loop()
                && !generic.contains(rel.source.as_str())
                && !generic.contains(rel.target.as_str())
        })
        .map(|rel| (rel.source.clone(), rel.name.clone(), rel.target.clone()))
        .collect();

    CompactOntology { e, r }
}
