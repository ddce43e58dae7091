//! End-to-end pipeline runs over local OWL documents.

use std::collections::HashSet;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use ontoforge_core::config::{FetchSettings, SelectionSettings};
use ontoforge_core::{
    AdapterRegistry, EngineSettings, FetchContext, ImportanceAnalyzer, KeywordTable,
    OntologyConfig, OntologyError, Pipeline,
};
use ontoforge_graph::{PruningAnomaly, PLACEHOLDER_ENTITY};

const HEADER: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:owl="http://www.w3.org/2002/07/owl#">
"#;

fn class(name: &str, comment: &str) -> String {
    format!(
        "  <owl:Class rdf:about=\"http://example.org/biz#{}\"><rdfs:comment>{}</rdfs:comment></owl:Class>\n",
        name, comment
    )
}

fn object_property(name: &str, domain: Option<&str>, range: Option<&str>, comment: &str) -> String {
    let mut body = format!(
        "  <owl:ObjectProperty rdf:about=\"http://example.org/biz#{}\">\n",
        name
    );
    if let Some(domain) = domain {
        body.push_str(&format!(
            "    <rdfs:domain rdf:resource=\"http://example.org/biz#{}\"/>\n",
            domain
        ));
    }
    if let Some(range) = range {
        body.push_str(&format!(
            "    <rdfs:range rdf:resource=\"http://example.org/biz#{}\"/>\n",
            range
        ));
    }
    body.push_str(&format!("    <rdfs:comment>{}</rdfs:comment>\n", comment));
    body.push_str("  </owl:ObjectProperty>\n");
    body
}

fn name_property(domain: &str) -> String {
    format!(
        r#"  <owl:DatatypeProperty rdf:about="http://example.org/biz#name">
    <rdfs:domain rdf:resource="http://example.org/biz#{}"/>
    <rdfs:range rdf:resource="http://www.w3.org/2001/XMLSchema#string"/>
  </owl:DatatypeProperty>
"#,
        domain
    )
}

fn document(imports: &[String], body: &[String]) -> String {
    let mut doc = String::from(HEADER);
    doc.push_str("  <owl:Ontology rdf:about=\"http://example.org/biz\">\n");
    for import in imports {
        doc.push_str(&format!("    <owl:imports rdf:resource=\"{}\"/>\n", import));
    }
    doc.push_str("  </owl:Ontology>\n");
    for part in body {
        doc.push_str(part);
    }
    doc.push_str("</rdf:RDF>\n");
    doc
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

fn pipeline(selection: SelectionSettings) -> Pipeline {
    let settings = EngineSettings {
        selection,
        ..Default::default()
    };
    let ctx = FetchContext::new(&FetchSettings::default(), None).unwrap();
    Pipeline::with_parts(
        AdapterRegistry::with_builtin(),
        settings,
        ctx,
        ImportanceAnalyzer::new(KeywordTable::builtin()),
    )
}

fn config(root: &Path, overrides: Value, context: Option<&str>) -> OntologyConfig {
    let mut value = json!({
        "name": "biz",
        "source": {
            "url": root.to_string_lossy(),
            "type": "owl",
            "version": "2.0",
            "description": "Business test ontology"
        },
        "extraction": {
            "entities": {
                "path": "owl:Class|rdfs:Class",
                "name": "rdfs:label",
                "namespaces": ["example.org/biz"]
            },
            "relationships": {
                "path": "owl:ObjectProperty",
                "name": "rdfs:label",
                "namespaces": ["example.org/biz"]
            }
        },
        "overrides": overrides,
        "metadata": { "localVersion": "7" }
    });
    if let Some(context) = context {
        value["context"] = json!(context);
    }
    OntologyConfig::from_value(value).unwrap()
}

/// Root document importing a common vocabulary.
fn write_business_fixture(dir: &Path) -> std::path::PathBuf {
    let root = dir.join("biz.owl");
    let common = dir.join("common.owl");

    std::fs::write(
        &common,
        document(
            &[],
            &[
                class("Person", ""),
                class("Address", ""),
                class("RegistrationCode", ""),
            ],
        ),
    )
    .unwrap();

    std::fs::write(
        &root,
        document(
            &[file_url(&common)],
            &[
                class("LegalEntity", "An entity recognised by law."),
                class("Organization", "A company."),
                class(
                    "PurchaseOrder",
                    "A purchase order placed by a buyer with a supplier for products",
                ),
                class(
                    "Invoice",
                    "A payment request for goods and services under a contract",
                ),
                name_property("Organization"),
                object_property("hasAddress", Some("LegalEntity"), Some("Address"), "Where it is registered."),
                object_property("employs", Some("Organization"), Some("Person"), "Employment."),
                object_property("hasCode", Some("Organization"), Some("RegistrationCode"), "Registry code."),
                object_property("billedTo", None, None, "The Invoice is billed to the LegalEntity."),
                object_property("relatesTo", None, None, "Something vague."),
            ],
        ),
    )
    .unwrap();

    root
}

#[tokio::test]
async fn test_end_to_end_extraction() {
    let dir = TempDir::new().unwrap();
    let root = write_business_fixture(dir.path());

    let overrides = json!({
        "entities": {
            "Invoice": {
                "properties": { "name": { "type": "string", "description": "Invoice label" } },
                "keyProperties": ["number"]
            }
        },
        "relationships": {
            "employs": { "description": "Employment contract" }
        }
    });
    let config = config(&root, overrides, Some("payment processing"));

    let output = pipeline(SelectionSettings {
        max_entities: 2,
        max_relationships: None,
    })
    .run(&config)
    .await
    .unwrap();
    let source = &output.source;

    // Top two by score plus every whitelisted name that is present
    let names = source.entity_names();
    assert_eq!(
        names,
        vec![
            "Address",
            PLACEHOLDER_ENTITY,
            "Invoice",
            "LegalEntity",
            "Organization",
            "Person",
            "PurchaseOrder",
        ]
    );
    assert_eq!(source.ignored_entities, vec!["RegistrationCode"]);
    assert_eq!(source.ignored_relationships, vec!["hasCode"]);

    // Referential integrity
    let retained: HashSet<&str> = names.iter().copied().collect();
    for relationship in &source.relationships {
        assert!(retained.contains(relationship.source.as_str()));
        assert!(retained.contains(relationship.target.as_str()));
    }

    // Inferred endpoints and overrides
    let billed = source
        .relationships
        .iter()
        .find(|r| r.name == "billedTo")
        .unwrap();
    assert_eq!(billed.source, "Invoice");
    assert_eq!(billed.target, "LegalEntity");
    let employs = source
        .relationships
        .iter()
        .find(|r| r.name == "employs")
        .unwrap();
    assert_eq!(employs.description, "Employment contract");

    let invoice = source.entity("Invoice").unwrap();
    assert!(invoice.properties.contains_key("number"));
    assert!(invoice.vector_index);
    assert!(!source.entity("Organization").unwrap().vector_index);
    assert!(!source.entity("PurchaseOrder").unwrap().vector_index);

    // Metadata
    assert_eq!(source.metadata.source_version.as_deref(), Some("2.0"));
    assert_eq!(source.metadata.local_version.as_deref(), Some("7"));
    assert!(source.metadata.last_extraction.is_some());

    // Compact projection drops the placeholder and its edges
    assert!(!output.compact.e.contains(&PLACEHOLDER_ENTITY.to_string()));
    assert_eq!(output.compact.e.len(), 6);
    assert_eq!(output.compact.r.len(), 3);
    assert!(output.compact.r.contains(&(
        "Invoice".to_string(),
        "billedTo".to_string(),
        "LegalEntity".to_string()
    )));

    assert_eq!(output.anomaly, None);
    assert!(output.failed_imports.is_empty());
    assert!(output.reports.iter().any(|r| r.stage == "pruning" && r.ignored == 1));
}

#[tokio::test]
async fn test_whitelisted_entity_survives_below_cut() {
    let dir = TempDir::new().unwrap();
    let root = write_business_fixture(dir.path());
    let config = config(&root, json!({}), None);

    let output = pipeline(SelectionSettings {
        max_entities: 1,
        max_relationships: None,
    })
    .run(&config)
    .await
    .unwrap();

    // Address has no keyword support and ranks near the bottom
    assert!(output.source.entity("Address").is_some());
    assert!(!output
        .source
        .ignored_entities
        .contains(&"Address".to_string()));
}

#[tokio::test]
async fn test_all_relationships_pruned_is_reported() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("gadgets.owl");
    std::fs::write(
        &root,
        document(
            &[],
            &[
                class("Widget", ""),
                class("Gadget", ""),
                object_property("fits", Some("Widget"), Some("Gadget"), ""),
                object_property("holds", Some("Gadget"), Some("Widget"), ""),
            ],
        ),
    )
    .unwrap();

    let output = pipeline(SelectionSettings {
        max_entities: 1,
        max_relationships: None,
    })
    .run(&config(&root, json!({}), None))
    .await
    .unwrap();

    assert!(output.source.relationships.is_empty());
    assert_eq!(output.source.ignored_relationships, vec!["fits", "holds"]);
    match output.anomaly {
        Some(PruningAnomaly::AllRelationshipsPruned { total, .. }) => assert_eq!(total, 2),
        other => panic!("expected critical anomaly, got {:?}", other),
    }
}

#[tokio::test]
async fn test_naming_policy_filters_invalid_identifiers() {
    let dir = TempDir::new().unwrap();
    let root = write_business_fixture(dir.path());
    let overrides = json!({
        "entities": { "9Lives": { "description": "Not an identifier" } },
        "relationships": {
            "owns": { "source": "Person", "target": "9Lives" }
        }
    });

    let output = pipeline(SelectionSettings::default())
        .run(&config(&root, overrides, None))
        .await
        .unwrap();

    assert!(output.source.entity("9Lives").is_none());
    assert!(output.source.ignored_entities.contains(&"9Lives".to_string()));
    assert!(output.source.ignored_relationships.contains(&"owns".to_string()));
}

#[tokio::test]
async fn test_missing_root_document_fails() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir.path().join("absent.owl"), json!({}), None);

    let err = pipeline(SelectionSettings::default())
        .run(&config)
        .await
        .unwrap_err();
    assert!(matches!(err, OntologyError::Fetch { .. }));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_work() {
    let dir = TempDir::new().unwrap();
    let root = write_business_fixture(dir.path());
    let mut config = config(&root, json!({}), None);
    config.name = String::new();
    config.extraction.entities.name = String::new();

    let err = pipeline(SelectionSettings::default())
        .run(&config)
        .await
        .unwrap_err();
    match err {
        OntologyError::ConfigValidation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_artifacts_are_written() {
    let dir = TempDir::new().unwrap();
    let root = write_business_fixture(dir.path());
    let output = pipeline(SelectionSettings::default())
        .run(&config(&root, json!({}), None))
        .await
        .unwrap();

    let out_dir = dir.path().join("out");
    let (source_path, compact_path) = output.write_artifacts(&out_dir).await.unwrap();
    assert!(source_path.ends_with("biz.source.json"));

    let source: Value = serde_json::from_str(&std::fs::read_to_string(source_path).unwrap()).unwrap();
    assert_eq!(source["name"], "biz");
    assert!(source["ignoredEntities"].is_array());

    let compact: Value =
        serde_json::from_str(&std::fs::read_to_string(compact_path).unwrap()).unwrap();
    assert!(compact["e"].is_array());
    assert!(compact["r"].is_array());
}
