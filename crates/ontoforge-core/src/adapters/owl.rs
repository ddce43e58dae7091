//! OWL / RDFS adapter for RDF/XML and Turtle documents.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use ontoforge_graph::{normalize_entity_name, Entity, PropertyDef, Relationship, SourceType};
use ontoforge_ingest::{compact_iri, local_name, parse_rdf, Node};

use super::{Candidate, EntityCandidate, ParsedOntology, RelationshipCandidate, SourceAdapter};
use crate::error::OntologyResult;
use crate::inference::RelationshipInferencer;

/// Vocabulary terms that are never domain entities.
pub const RESERVED_NAMES: &[&str] = &[
    "Thing",
    "Nothing",
    "Class",
    "Resource",
    "Literal",
    "Property",
    "Ontology",
    "Restriction",
    "ObjectProperty",
    "DatatypeProperty",
    "AnnotationProperty",
    "NamedIndividual",
    "type",
    "domain",
    "range",
    "label",
    "comment",
    "subClassOf",
    "subPropertyOf",
    "seeAlso",
    "isDefinedBy",
    "sameAs",
    "equivalentClass",
];

const CLASS_KINDS: &[&str] = &["owl:Class", "rdfs:Class"];
const OBJECT_PROPERTY_KINDS: &[&str] = &["owl:ObjectProperty"];
const DATATYPE_PROPERTY_KINDS: &[&str] = &["owl:DatatypeProperty"];

/// Description predicates, most preferred first.
const DESCRIPTION_PREDICATES: &[&str] = &["skos:definition", "rdfs:comment", "rdfs:label"];

pub struct OwlAdapter;

#[async_trait]
impl SourceAdapter for OwlAdapter {
    fn name(&self) -> &'static str {
        "owl"
    }

    fn handles_type(&self, kind: SourceType) -> bool {
        matches!(kind, SourceType::Owl | SourceType::Rdf)
    }

    fn can_handle(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        [".owl", ".rdf", ".ttl", ".n3", ".xml"]
            .iter()
            .any(|ext| lower.ends_with(ext))
            || lower.contains("/owl")
            || lower.contains("rdf")
    }

    fn parse(&self, text: &str, url: &str) -> OntologyResult<ParsedOntology> {
        let document = parse_rdf(text, url);
        if document.is_empty() {
            return Ok(ParsedOntology::empty(url));
        }

        let nodes = document.root.descendants();
        let base = document.base.as_str();

        let mut entities = collect_classes(&nodes, base);
        attach_datatype_properties(&nodes, base, &mut entities);

        // Inference needs the complete entity vocabulary of this document
        let inferencer =
            RelationshipInferencer::new(entities.iter().map(|c| c.item.name.clone()));
        let relationships = collect_object_properties(&nodes, base, &inferencer);
        let imports = collect_imports(&nodes, base);

        info!(
            "Parsed {}: {} classes, {} object properties, {} imports",
            url,
            entities.len(),
            relationships.len(),
            imports.len()
        );

        Ok(ParsedOntology {
            url: url.to_string(),
            base_uri: base.to_string(),
            entities,
            relationships,
            imports,
            documents: Vec::new(),
        })
    }
}

/// The declaring kind of a node: its element name, or its `rdf:type`.
fn declared_kind<'a>(node: &Node, kinds: &'a [&'a str]) -> Option<&'a str> {
    if let Some(kind) = kinds.iter().find(|k| node.is(k)) {
        return Some(*kind);
    }
    node.children_named("rdf:type")
        .filter_map(|t| t.attr("rdf:resource"))
        .map(compact_iri)
        .find_map(|t| kinds.iter().find(|k| **k == t).copied())
}

fn resolve(base: &str, reference: &str) -> String {
    if reference.contains("://") {
        return reference.to_string();
    }
    match url::Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!("{}{}", base, reference),
    }
}

fn is_reserved(local: &str) -> bool {
    RESERVED_NAMES.contains(&local)
}

/// Normalized entity name for a resource IRI, unless it is reserved.
fn entity_name(iri: &str) -> Option<String> {
    let local = local_name(iri);
    if local.is_empty() || is_reserved(local) {
        return None;
    }
    normalize_entity_name(Some(local)).filter(|n| !is_reserved(n))
}

fn description(node: &Node) -> String {
    DESCRIPTION_PREDICATES
        .iter()
        .find_map(|p| node.child_text(p))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn collect_classes(nodes: &[&Node], base: &str) -> Vec<EntityCandidate> {
    let mut out: Vec<EntityCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for node in nodes {
        let Some(kind) = declared_kind(node, CLASS_KINDS) else {
            continue;
        };
        let Some(subject) = node.subject(base) else {
            continue;
        };
        let uri = resolve(base, &subject);
        let Some(name) = entity_name(&uri) else {
            debug!("Skipping reserved or unnamed class {}", uri);
            continue;
        };

        let parent = node
            .children_named("rdfs:subClassOf")
            .filter_map(|c| c.reference(base))
            .find_map(|iri| entity_name(&iri));
        let description = description(node);

        // The same class may be described by several nodes; fill gaps only
        if let Some(&i) = index.get(&name) {
            let existing = &mut out[i].item;
            if existing.description.is_empty() {
                existing.description = description;
            }
            if existing.parent.is_none() {
                existing.parent = parent;
            }
            continue;
        }

        let mut entity = Entity::new(name.clone(), description).with_documentation(uri.clone());
        entity.parent = parent;
        index.insert(name, out.len());
        out.push(Candidate::new(entity, uri, kind));
    }

    out
}

fn attach_datatype_properties(nodes: &[&Node], base: &str, entities: &mut [EntityCandidate]) {
    let index: HashMap<String, usize> = entities
        .iter()
        .enumerate()
        .map(|(i, c)| (c.item.name.clone(), i))
        .collect();

    for node in nodes {
        if declared_kind(node, DATATYPE_PROPERTY_KINDS).is_none() {
            continue;
        }
        let Some(subject) = node.subject(base) else {
            continue;
        };
        let property = local_name(&subject).to_string();
        if property.is_empty() {
            continue;
        }
        let Some(domain) = node
            .child_reference("rdfs:domain", base)
            .and_then(|iri| entity_name(&iri))
        else {
            continue;
        };
        let Some(&i) = index.get(&domain) else {
            continue;
        };

        let kind = node
            .child_reference("rdfs:range", base)
            .map(|iri| compact_iri(&iri))
            .and_then(|range| range.strip_prefix("xsd:").map(str::to_string))
            .unwrap_or_else(|| "string".to_string());
        entities[i]
            .item
            .properties
            .entry(property)
            .or_insert_with(|| PropertyDef::new(kind, description(node)));
    }
}

fn collect_object_properties(
    nodes: &[&Node],
    base: &str,
    inferencer: &RelationshipInferencer,
) -> Vec<RelationshipCandidate> {
    let mut out = Vec::new();

    for node in nodes {
        let Some(kind) = declared_kind(node, OBJECT_PROPERTY_KINDS) else {
            continue;
        };
        let Some(subject) = node.subject(base) else {
            continue;
        };
        let uri = resolve(base, &subject);
        let name = local_name(&uri).to_string();
        if name.is_empty() || is_reserved(&name) {
            continue;
        }

        let description = description(node);
        let source = node
            .child_reference("rdfs:domain", base)
            .and_then(|iri| entity_name(&iri))
            .unwrap_or_default();
        let target = node
            .child_reference("rdfs:range", base)
            .and_then(|iri| entity_name(&iri))
            .unwrap_or_default();

        let mut relationship = Relationship::new(name, source, target)
            .with_description(description.clone());
        relationship.documentation = uri.clone();
        inferencer.infer(&mut relationship, &description);

        out.push(Candidate::new(relationship, uri, kind));
    }

    out
}

fn collect_imports(nodes: &[&Node], base: &str) -> Vec<String> {
    let mut imports: Vec<String> = Vec::new();
    for node in nodes.iter().filter(|n| n.is("owl:imports")) {
        let reference = node
            .attr("rdf:resource")
            .or_else(|| Some(node.text.as_str()).filter(|t| !t.is_empty()));
        if let Some(reference) = reference {
            let uri = resolve(base, reference);
            if !imports.contains(&uri) {
                imports.push(uri);
            }
        }
    }
    imports
}
