//! Core types shared by every stage of the pipeline.
//!
//! - `Entity` / `Relationship`: the named nodes and typed edges we extract
//! - `SourceOntology`: the full, canonical output artifact
//! - `CompactOntology`: the lossy `{e, r}` projection for downstream consumers
//! - `SourceInfo` / `Metadata`: provenance carried from config into output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name used when a relationship endpoint cannot be determined.
pub const PLACEHOLDER_ENTITY: &str = "Entity";

/// Description given to key properties that were listed but never defined.
pub const BACKFILLED_PROPERTY_DESCRIPTION: &str = "Key property (auto-generated)";

/// A single property definition on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    #[serde(rename = "type", default = "default_property_type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

fn default_property_type() -> String {
    "string".to_string()
}

impl PropertyDef {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Placeholder definition for a key property that had no definition.
    pub fn backfilled() -> Self {
        Self::new("string", BACKFILLED_PROPERTY_DESCRIPTION)
    }
}

/// A named concept node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDef>,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default)]
    pub vector_index: bool,
    #[serde(default)]
    pub documentation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Entity {
    /// Create an entity with only a name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: BTreeMap::new(),
            key_properties: Vec::new(),
            vector_index: false,
            documentation: String::new(),
            parent: None,
        }
    }

    pub fn with_documentation(mut self, uri: impl Into<String>) -> Self {
        self.documentation = uri.into();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    /// Ensure every name in `key_properties` has a definition.
    ///
    /// Returns how many definitions were added.
    pub fn backfill_key_properties(&mut self) -> usize {
        let mut added = 0;
        for key in &self.key_properties {
            if !self.properties.contains_key(key) {
                self.properties.insert(key.clone(), PropertyDef::backfilled());
                added += 1;
            }
        }
        added
    }

    /// True if the entity has a property literally named `name` or `label`.
    pub fn has_label_property(&self) -> bool {
        self.properties.keys().any(|key| {
            let key = key.to_lowercase();
            key == "name" || key == "label"
        })
    }
}

/// A named, directed edge between two entity names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub documentation: String,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            source: source.into(),
            target: target.into(),
            documentation: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Serialization family of the configured source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Owl,
    Rdf,
    Json,
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Owl => "owl",
            SourceType::Rdf => "rdf",
            SourceType::Json => "json",
            SourceType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owl" => Some(SourceType::Owl),
            "rdf" => Some(SourceType::Rdf),
            "json" => Some(SourceType::Json),
            "other" => Some(SourceType::Other),
            _ => None,
        }
    }
}

/// Where an ontology came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SourceType,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// Extraction bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub last_extraction: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub local_version: Option<String>,
}

/// The canonical output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOntology {
    pub name: String,
    pub source: SourceInfo,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub ignored_entities: Vec<String>,
    #[serde(default)]
    pub ignored_relationships: Vec<String>,
}

impl SourceOntology {
    pub fn new(name: impl Into<String>, source: SourceInfo) -> Self {
        Self {
            name: name.into(),
            source,
            entities: Vec::new(),
            relationships: Vec::new(),
            metadata: Metadata::default(),
            ignored_entities: Vec::new(),
            ignored_relationships: Vec::new(),
        }
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Sort entities and relationships by name, and normalize ignored lists.
    ///
    /// Names compare case-insensitively first and fall back to the exact
    /// name so the order is total.
    pub fn sort_for_output(&mut self) {
        self.entities
            .sort_by(|a, b| compare_names(&a.name, &b.name));
        self.relationships.sort_by(|a, b| {
            compare_names(&a.name, &b.name)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });
        self.ignored_entities = dedup_sorted(std::mem::take(&mut self.ignored_entities));
        self.ignored_relationships =
            dedup_sorted(std::mem::take(&mut self.ignored_relationships));
    }
}

/// Case-insensitive name ordering with a deterministic tie-break.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Deduplicate and alphabetize a list of names.
pub fn dedup_sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort_by(|a, b| compare_names(a, b));
    names.dedup();
    names
}

/// Minimized `{e, r}` projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactOntology {
    pub e: Vec<String>,
    pub r: Vec<(String, String, String)>,
}
