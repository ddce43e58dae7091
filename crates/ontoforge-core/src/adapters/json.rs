//! JSON Schema / plain JSON adapter.
//!
//! `parse` collects schema definitions (`definitions`, `$defs`,
//! `components.schemas`) as entities and `$ref`-typed properties as
//! relationships. Rules with a dotted `path` that resolves inside the raw
//! document are applied to the objects found there instead, reading the
//! fields the rule names.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use ontoforge_graph::{normalize_entity_name, Entity, PropertyDef, Relationship, SourceType};

use super::{
    fetch_document, CacheNamespace, Candidate, EntityCandidate, FetchContext, ParsedOntology,
    RelationshipCandidate, SourceAdapter,
};
use crate::config::Rule;
use crate::error::{OntologyError, OntologyResult};
use crate::inference::RelationshipInferencer;
use crate::rules::{RuleEngine, Selection};

/// Containers holding named schema definitions.
const DEFINITION_CONTAINERS: &[&str] = &["definitions", "$defs", "components.schemas"];

const REF_KIND: &str = "$ref";

pub struct JsonAdapter;

#[async_trait]
impl SourceAdapter for JsonAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn handles_type(&self, kind: SourceType) -> bool {
        kind == SourceType::Json
    }

    fn can_handle(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        lower.ends_with(".json") || lower.ends_with(".schema") || lower.contains("json-schema")
    }

    async fn fetch(&self, ctx: &FetchContext, url: &str) -> OntologyResult<String> {
        fetch_document(ctx, url, CacheNamespace::Dataset).await
    }

    fn parse(&self, text: &str, url: &str) -> OntologyResult<ParsedOntology> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| OntologyError::parse(url, e.to_string()))?;

        let mut parsed = ParsedOntology::empty(url);
        for container in DEFINITION_CONTAINERS {
            let Some(Value::Object(definitions)) = resolve_path(&document, container) else {
                continue;
            };
            for (key, definition) in definitions {
                collect_definition(&mut parsed, container, key, definition);
            }
        }

        // A bare schema with a title describes a single entity
        if parsed.entities.is_empty() {
            if let Some(title) = document.get("title").and_then(Value::as_str) {
                if document.get("properties").is_some() {
                    collect_definition(&mut parsed, "", title, &document);
                }
            }
        }

        info!(
            "Parsed {}: {} definitions, {} references, {} external imports",
            url,
            parsed.entities.len(),
            parsed.relationships.len(),
            parsed.imports.len()
        );
        parsed.documents.push(document);
        Ok(parsed)
    }

    fn extract_entities(
        &self,
        engine: &RuleEngine,
        rule: &Rule,
        parsed: &ParsedOntology,
    ) -> Selection<Entity> {
        let Some(objects) = objects_at_path(parsed, &rule.path) else {
            return engine.select(rule, &parsed.entities);
        };

        let candidates: Vec<EntityCandidate> = objects
            .into_iter()
            .filter_map(|(key, object)| {
                let raw = field(object, &rule.name).or(key)?;
                let name = normalize_entity_name(Some(raw))?;
                let mut entity = Entity::new(name, field(object, &rule.description).unwrap_or_default());
                entity.properties = properties_of(object);
                Some(Candidate::new(entity, path_uri(&parsed.url, &rule.path), rule.path.clone()))
            })
            .collect();
        debug!("Rule path {} yielded {} entities", rule.path, candidates.len());

        engine.select(&wildcard(rule), &candidates)
    }

    fn extract_relationships(
        &self,
        engine: &RuleEngine,
        rule: &Rule,
        parsed: &ParsedOntology,
    ) -> Selection<Relationship> {
        let Some(objects) = objects_at_path(parsed, &rule.path) else {
            return engine.select(rule, &parsed.relationships);
        };

        let inferencer = RelationshipInferencer::new(parsed.entity_names());
        let source_field = rule.source.as_deref().unwrap_or("source");
        let target_field = rule.target.as_deref().unwrap_or("target");

        let candidates: Vec<RelationshipCandidate> = objects
            .into_iter()
            .filter_map(|(key, object)| {
                let name = field(object, &rule.name).or(key)?.to_string();
                let description = field(object, &rule.description).unwrap_or_default();
                let endpoint = |f: &str| {
                    field(object, f)
                        .and_then(|v| normalize_entity_name(Some(v)))
                        .unwrap_or_default()
                };
                let mut relationship =
                    Relationship::new(name, endpoint(source_field), endpoint(target_field))
                        .with_description(description);
                inferencer.infer(&mut relationship, description);
                Some(Candidate::new(
                    relationship,
                    path_uri(&parsed.url, &rule.path),
                    rule.path.clone(),
                ))
            })
            .collect();

        engine.select(&wildcard(rule), &candidates)
    }
}

/// Same namespaces, all kinds: the path already did the selecting.
fn wildcard(rule: &Rule) -> Rule {
    Rule {
        path: "*".to_string(),
        ..rule.clone()
    }
}

fn path_uri(url: &str, path: &str) -> String {
    format!("{}#/{}", url, path.replace('.', "/"))
}

/// Follow a dotted path through nested objects.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| current.get(segment))
}

/// Objects found at `path` in any document, with their map key if any.
fn objects_at_path<'a>(
    parsed: &'a ParsedOntology,
    path: &str,
) -> Option<Vec<(Option<&'a str>, &'a Map<String, Value>)>> {
    let path = path.trim();
    if path.is_empty() || path == "*" || path.contains('|') {
        return None;
    }

    let mut found = Vec::new();
    let mut resolved = false;
    for document in &parsed.documents {
        match resolve_path(document, path) {
            Some(Value::Array(items)) => {
                resolved = true;
                found.extend(items.iter().filter_map(Value::as_object).map(|o| (None, o)));
            }
            Some(Value::Object(map)) => {
                resolved = true;
                found.extend(
                    map.iter()
                        .filter_map(|(k, v)| v.as_object().map(|o| (Some(k.as_str()), o))),
                );
            }
            _ => {}
        }
    }
    resolved.then_some(found)
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }
    object.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn property_type(definition: &Value) -> String {
    match definition.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|k| *k != "null")
            .unwrap_or("string")
            .to_string(),
        _ if definition.get(REF_KIND).is_some() => "object".to_string(),
        _ => "string".to_string(),
    }
}

fn properties_of(object: &Map<String, Value>) -> std::collections::BTreeMap<String, PropertyDef> {
    object
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, def)| {
                    let description = def
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    (name.clone(), PropertyDef::new(property_type(def), description))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The `$ref` of a property, looking through array `items`.
fn reference(definition: &Value) -> Option<&str> {
    definition
        .get(REF_KIND)
        .or_else(|| definition.get("items").and_then(|i| i.get(REF_KIND)))
        .and_then(Value::as_str)
}

fn collect_definition(parsed: &mut ParsedOntology, container: &str, key: &str, definition: &Value) {
    let Some(object) = definition.as_object() else {
        return;
    };
    let Some(name) = normalize_entity_name(Some(key)) else {
        return;
    };
    let pointer = if container.is_empty() {
        String::new()
    } else {
        format!("{}/{}", container.replace('.', "/"), key)
    };
    let uri = format!("{}#/{}", parsed.url, pointer);
    let description = ["description", "title"]
        .iter()
        .find_map(|f| field(object, f))
        .unwrap_or_default();

    let mut entity = Entity::new(name.clone(), description).with_documentation(uri.clone());
    entity.properties = properties_of(object);

    if let Some(props) = object.get("properties").and_then(Value::as_object) {
        for (prop_name, prop) in props {
            let Some(reference) = reference(prop) else {
                continue;
            };
            let (location, fragment) = reference.split_once('#').unwrap_or((reference, ""));
            if !location.is_empty() {
                let import = resolve_location(&parsed.url, location);
                if !parsed.imports.contains(&import) {
                    parsed.imports.push(import);
                }
            }
            let target_raw = fragment.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or_else(|| {
                location
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .trim_end_matches(".json")
            });
            let Some(target) = normalize_entity_name(Some(target_raw)) else {
                continue;
            };
            let description = prop
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let relationship =
                Relationship::new(prop_name.clone(), name.clone(), target).with_description(description);
            parsed.relationships.push(Candidate::new(
                relationship,
                format!("{}/properties/{}", uri, prop_name),
                REF_KIND,
            ));
        }
    }

    parsed.entities.push(Candidate::new(entity, uri, container));
}

fn resolve_location(base: &str, location: &str) -> String {
    match url::Url::parse(base).and_then(|b| b.join(location)) {
        Ok(joined) => joined.to_string(),
        Err(_) => location.to_string(),
    }
}
