//! Ontoforge Graph - the entity/relationship model and graph-level passes.
//!
//! This crate holds everything that operates on an already-extracted graph:
//!
//! - **Schema**: `Entity`, `Relationship`, and the two output artifacts
//! - **Naming**: name normalization and pluggable sink naming policies
//! - **Prune**: referential pruning with anomaly detection
//! - **Compact**: the minimized `{e, r}` projection
//!
//! # Example
//!
//! ```ignore
//! use ontoforge_graph::{compact, prune_relationships, normalize_entity_name};
//!
//! let name = normalize_entity_name(Some("E22_Man-Made_Object"));
//! assert_eq!(name.as_deref(), Some("ManMadeObject"));
//!
//! let report = prune_relationships(ontology.relationships.clone(), &retained);
//! ontology.relationships = report.kept;
//! let projection = compact(&ontology);
//! ```

pub mod compact;
pub mod naming;
pub mod prune;
pub mod schema;

pub use compact::{compact, GENERIC_ENTITIES, GENERIC_RELATIONSHIP_TYPES};
pub use naming::{
    is_valid_entity_name, normalize_entity_name, IdentifierPolicy, PermissivePolicy,
    SinkNamingPolicy,
};
pub use prune::{
    check_pruning_anomaly, prune_relationships, split_by_endpoints, PruneReport, PruningAnomaly,
};
pub use schema::{
    compare_names, dedup_sorted, CompactOntology, Entity, Metadata, PropertyDef, Relationship,
    SourceInfo, SourceOntology, SourceType, BACKFILLED_PROPERTY_DESCRIPTION, PLACEHOLDER_ENTITY,
};
