//! Configuration: the per-ontology config document and engine settings.
//!
//! - `OntologyConfig`: JSON document naming one source, its extraction
//!   rules and local overrides. Validated up front with every problem
//!   reported at once.
//! - `EngineSettings`: `ontoforge.toml`, shared by every run. A missing file
//!   means built-in defaults.
//! - `OntoPaths`: where the data directory, cache and settings live.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ontoforge_graph::{
    IdentifierPolicy, Metadata, PermissivePolicy, SinkNamingPolicy, SourceInfo, SourceType,
};

use crate::error::{OntologyError, OntologyResult};
use crate::importance::KeywordTable;
use crate::imports::DuplicatePolicy;

/// Declarative selection rule for entities or relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// For RDF sources, a `|`-separated list of declaring kinds
    /// (`owl:Class|rdfs:Class`); `*` or empty keeps all. For JSON sources, a
    /// dotted path into the document.
    #[serde(default)]
    pub path: String,
    /// Field holding the name (JSON sources).
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Namespace keywords a candidate's URI must contain. Empty means the
    /// family defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub entities: Rule,
    pub relationships: Rule,
}

/// Local patches applied on top of extracted data, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub entities: Map<String, Value>,
    #[serde(default)]
    pub relationships: Map<String, Value>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// One ontology's config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyConfig {
    pub name: String,
    pub source: SourceInfo,
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    pub metadata: Metadata,
    /// Free-text domain context passed to the importance analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl OntologyConfig {
    /// Read and validate a config document from disk.
    pub fn load(path: &Path) -> OntologyResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Self::from_value(value)
    }

    /// Validate a raw JSON value, then deserialize it.
    pub fn from_value(value: Value) -> OntologyResult<Self> {
        let errors = validate_config_value(&value);
        if !errors.is_empty() {
            return Err(OntologyError::ConfigValidation(errors));
        }
        serde_json::from_value(value)
            .map_err(|e| OntologyError::ConfigValidation(vec![e.to_string()]))
    }
}

/// Check a config document, collecting every problem instead of stopping at
/// the first.
pub fn validate_config_value(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(root) = value.as_object() else {
        errors.push("config must be a JSON object".to_string());
        return errors;
    };

    require_string(root, "name", "name", &mut errors);

    match root.get("source") {
        Some(Value::Object(source)) => {
            if let Some(url) = require_string(source, "url", "source.url", &mut errors) {
                if let Err(reason) = check_source_url(url) {
                    errors.push(format!("source.url: {}", reason));
                }
            }
            match source.get("type") {
                Some(Value::String(kind)) if SourceType::parse(kind).is_some() => {}
                Some(Value::String(kind)) => errors.push(format!(
                    "source.type: '{}' is not one of owl, rdf, json, other",
                    kind
                )),
                Some(_) => errors.push("source.type: must be a string".to_string()),
                None => errors.push("source.type: required".to_string()),
            }
            for field in ["version", "description"] {
                if let Some(v) = source.get(field) {
                    if !v.is_string() {
                        errors.push(format!("source.{}: must be a string", field));
                    }
                }
            }
        }
        Some(_) => errors.push("source: must be an object".to_string()),
        None => errors.push("source: required".to_string()),
    }

    match root.get("extraction") {
        Some(Value::Object(extraction)) => {
            for kind in ["entities", "relationships"] {
                let prefix = format!("extraction.{}", kind);
                match extraction.get(kind) {
                    Some(Value::Object(rule)) => validate_rule(rule, &prefix, &mut errors),
                    Some(_) => errors.push(format!("{}: must be an object", prefix)),
                    None => errors.push(format!("{}: required", prefix)),
                }
            }
        }
        Some(_) => errors.push("extraction: must be an object".to_string()),
        None => errors.push("extraction: required".to_string()),
    }

    match root.get("overrides") {
        None | Some(Value::Null) => {}
        Some(Value::Object(overrides)) => {
            for kind in ["entities", "relationships"] {
                match overrides.get(kind) {
                    None | Some(Value::Null) => {}
                    Some(Value::Object(entries)) => {
                        for (key, entry) in entries {
                            if !entry.is_object() {
                                errors.push(format!(
                                    "overrides.{}.{}: must be an object",
                                    kind, key
                                ));
                            }
                        }
                    }
                    Some(_) => errors.push(format!("overrides.{}: must be an object", kind)),
                }
            }
        }
        Some(_) => errors.push("overrides: must be an object".to_string()),
    }

    if let Some(metadata) = root.get("metadata") {
        if !metadata.is_object() && !metadata.is_null() {
            errors.push("metadata: must be an object".to_string());
        }
    }

    errors
}

fn require_string<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        Some(Value::String(_)) => {
            errors.push(format!("{}: must not be empty", path));
            None
        }
        Some(_) => {
            errors.push(format!("{}: must be a string", path));
            None
        }
        None => {
            errors.push(format!("{}: required", path));
            None
        }
    }
}

fn validate_rule(rule: &Map<String, Value>, prefix: &str, errors: &mut Vec<String>) {
    match rule.get("path") {
        Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("{}.path: must be a string", prefix)),
        None => errors.push(format!("{}.path: required", prefix)),
    }
    require_string(rule, "name", &format!("{}.name", prefix), errors);
    for field in ["description", "source", "target"] {
        if let Some(v) = rule.get(field) {
            if !v.is_string() && !v.is_null() {
                errors.push(format!("{}.{}: must be a string", prefix, field));
            }
        }
    }
    if let Some(namespaces) = rule.get("namespaces") {
        let valid = namespaces
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !valid {
            errors.push(format!("{}.namespaces: must be an array of strings", prefix));
        }
    }
}

/// Accept `http`/`https`/`file` URLs and plain filesystem paths.
fn check_source_url(raw: &str) -> Result<(), String> {
    if raw.chars().any(char::is_whitespace) {
        return Err(format!("'{}' contains whitespace", raw));
    }
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(()),
            "http" | "https" => Err(format!("'{}' has no host", raw)),
            "file" => Ok(()),
            // Windows drive letters parse as a one-letter scheme
            scheme if scheme.len() == 1 => Ok(()),
            scheme => Err(format!("unsupported scheme '{}'", scheme)),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(format!("'{}' is not a valid URL: {}", raw, e)),
    }
}

/// Which sink naming policy filters the final entity set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicyKind {
    #[default]
    Identifier,
    Permissive,
}

impl NamingPolicyKind {
    pub fn build(&self) -> Box<dyn SinkNamingPolicy> {
        match self {
            NamingPolicyKind::Identifier => Box::new(IdentifierPolicy),
            NamingPolicyKind::Permissive => Box::new(PermissivePolicy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// How many entities survive importance selection (before the core
    /// whitelist is added back).
    pub max_entities: usize,
    /// Optional top-N cut for relationships before referential pruning.
    pub max_relationships: Option<usize>,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            max_entities: 50,
            max_relationships: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Remote scoring service. `None` means heuristic only.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 5,
        }
    }
}

/// Engine-wide settings from `ontoforge.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Overrides the cache location derived from `OntoPaths`.
    pub cache_dir: Option<PathBuf>,
    pub selection: SelectionSettings,
    pub scoring: ScoringSettings,
    pub fetch: FetchSettings,
    pub duplicate_policy: DuplicatePolicy,
    pub naming_policy: NamingPolicyKind,
    /// Replaces the built-in heuristic keyword table when present.
    pub keywords: Option<KeywordTable>,
}

impl EngineSettings {
    /// Load settings from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn cache_root(&self, paths: &OntoPaths) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| paths.cache_dir.clone())
    }

    pub fn keyword_table(&self) -> KeywordTable {
        self.keywords.clone().unwrap_or_default()
    }
}

/// Filesystem locations used by the engine.
#[derive(Debug, Clone)]
pub struct OntoPaths {
    pub base_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl OntoPaths {
    /// `ONTOFORGE_DATA_DIR` if set, else the platform data directory.
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var_os("ONTOFORGE_DATA_DIR") {
            return Self::from_base(PathBuf::from(dir));
        }
        if let Some(dirs) = directories::ProjectDirs::from("org", "ontoforge", "ontoforge") {
            return Self::from_base(dirs.data_dir().to_path_buf());
        }
        Self::from_base(PathBuf::from(".ontoforge"))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let cache_dir = base_dir.join("cache");
        let settings_path = base_dir.join("ontoforge.toml");
        Self {
            base_dir,
            cache_dir,
            settings_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn valid_config() -> Value {
        json!({
            "name": "fibo-be",
            "source": {
                "url": "https://spec.edmcouncil.org/fibo/ontology/BE/",
                "type": "owl",
                "version": "2024Q1",
                "description": "FIBO business entities"
            },
            "extraction": {
                "entities": { "path": "owl:Class", "name": "rdf:about", "description": "rdfs:comment" },
                "relationships": { "path": "owl:ObjectProperty", "name": "rdf:about", "description": "rdfs:comment" }
            },
            "overrides": {
                "entities": { "LegalEntity": { "vectorIndex": true } },
                "relationships": {}
            }
        })
    }

    #[test]
    fn test_valid_config_parses() {
        let config = OntologyConfig::from_value(valid_config()).unwrap();
        assert_eq!(config.name, "fibo-be");
        assert_eq!(config.source.kind, SourceType::Owl);
        assert_eq!(config.extraction.entities.path, "owl:Class");
        assert!(config.overrides.entities.contains_key("LegalEntity"));
        assert_eq!(config.metadata, Metadata::default());
    }

    #[test]
    fn test_validation_aggregates_errors() {
        let value = json!({
            "source": { "url": "ftp://example.org/onto.owl", "type": "xml" },
            "extraction": { "entities": { "path": "*" } },
            "overrides": { "entities": { "Broken": 3 } }
        });

        let errors = validate_config_value(&value);

        assert!(errors.contains(&"name: required".to_string()));
        assert!(errors.iter().any(|e| e.starts_with("source.url: unsupported scheme")));
        assert!(errors.iter().any(|e| e.starts_with("source.type: 'xml'")));
        assert!(errors.contains(&"extraction.entities.name: required".to_string()));
        assert!(errors.contains(&"extraction.relationships: required".to_string()));
        assert!(errors.contains(&"overrides.entities.Broken: must be an object".to_string()));
        assert_eq!(errors.len(), 6);

        match OntologyConfig::from_value(value) {
            Err(OntologyError::ConfigValidation(list)) => assert_eq!(list.len(), 6),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_source_url_forms() {
        assert!(check_source_url("https://schema.org/version/latest/schemaorg.ttl").is_ok());
        assert!(check_source_url("file:///tmp/onto.owl").is_ok());
        assert!(check_source_url("./ontologies/local.owl").is_ok());
        assert!(check_source_url("/abs/path/onto.rdf").is_ok());
        assert!(check_source_url("http://").is_err());
        assert!(check_source_url("has space.owl").is_err());
    }

    #[test]
    fn test_non_object_config() {
        assert_eq!(
            validate_config_value(&json!([1, 2])),
            vec!["config must be a JSON object".to_string()]
        );
    }

    #[test]
    fn test_settings_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let settings = EngineSettings::load(&temp_dir.path().join("ontoforge.toml")).unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.selection.max_entities, 50);
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::FirstWins);
    }

    #[test]
    fn test_settings_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ontoforge.toml");
        std::fs::write(
            &path,
            r#"
duplicate_policy = "last_wins"
naming_policy = "permissive"

[selection]
max_entities = 10
max_relationships = 25

[scoring]
endpoint = "http://localhost:8089/analyze"
timeout_secs = 5

[keywords]
[[keywords.groups]]
name = "maritime"
weight = 0.1
cap = 0.2
keywords = ["vessel"]
"#,
        )
        .unwrap();

        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::LastWins);
        assert_eq!(settings.naming_policy, NamingPolicyKind::Permissive);
        assert_eq!(settings.selection.max_entities, 10);
        assert_eq!(settings.selection.max_relationships, Some(25));
        assert_eq!(settings.scoring.timeout_secs, 5);
        assert_eq!(settings.fetch, FetchSettings::default());
        assert_eq!(settings.keyword_table().groups[0].name, "maritime");
    }

    #[test]
    fn test_paths_from_base() {
        let paths = OntoPaths::from_base(PathBuf::from("/data/ontoforge"));
        assert_eq!(paths.cache_dir, PathBuf::from("/data/ontoforge/cache"));
        assert_eq!(paths.settings_path, PathBuf::from("/data/ontoforge/ontoforge.toml"));

        let settings = EngineSettings::default();
        assert_eq!(settings.cache_root(&paths), paths.cache_dir);
    }
}
