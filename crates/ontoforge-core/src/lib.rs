//! Ontoforge Core - config-driven ontology extraction.
//!
//! Turns an RDF/OWL or JSON-schema source into a pruned entity/relationship
//! graph:
//!
//! - **Adapters**: fetch (local, cached, remote) and parse source documents
//! - **Imports**: transitive closure over import edges
//! - **Inference**: recover missing relationship endpoints from definitions
//! - **Rules**: per-family extraction rules
//! - **Merge**: config overrides deep-merged onto extracted data
//! - **Importance**: remote or heuristic salience scoring and selection
//! - **Pipeline**: the whole chain, plus artifact writing
//!
//! # Example
//!
//! ```ignore
//! use ontoforge_core::{EngineSettings, OntoPaths, OntologyConfig, Pipeline};
//!
//! let paths = OntoPaths::from_env();
//! let settings = EngineSettings::load(&paths.settings_path)?;
//! let config = OntologyConfig::load(Path::new("fibo.json"))?;
//!
//! let output = Pipeline::new(settings, &paths)?.run(&config).await?;
//! output.write_artifacts(Path::new("out")).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod importance;
pub mod imports;
pub mod inference;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod rules;

pub use adapters::{
    AdapterRegistry, Candidate, FetchContext, JsonAdapter, OwlAdapter, ParsedOntology,
    SourceAdapter,
};
pub use config::{
    validate_config_value, EngineSettings, ExtractionConfig, NamingPolicyKind, OntoPaths,
    OntologyConfig, Overrides, Rule,
};
pub use error::{OntologyError, OntologyResult};
pub use importance::{
    ImportanceAnalyzer, KeywordGroup, KeywordTable, ScoredItem, ScoringService, CORE_WHITELIST,
};
pub use imports::{DuplicatePolicy, ImportClosure, ImportResolver};
pub use inference::RelationshipInferencer;
pub use merge::merge;
pub use pipeline::{Pipeline, PipelineOutput};
pub use report::StageReport;
pub use rules::{RuleEngine, Selection};
