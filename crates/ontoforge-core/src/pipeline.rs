//! End-to-end extraction for one ontology config.
//!
//! Stages, in order:
//! 1. Validate the config (all errors at once)
//! 2. Resolve the import closure of the source document
//! 3. Apply the extraction rules
//! 4. Merge config overrides
//! 5. Materialize the placeholder entity if relationships point at it
//! 6. Importance selection of entities (top N + core whitelist)
//! 7. Sink naming policy
//! 8. Optional relationship top-N
//! 9. Referential pruning with anomaly check
//! 10. Vector index flags, sorting, metadata, compaction

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, instrument};

use ontoforge_graph::{
    check_pruning_anomaly, compact, split_by_endpoints, CompactOntology, Entity, PruningAnomaly,
    SourceOntology, PLACEHOLDER_ENTITY,
};
use ontoforge_ingest::{sanitize_segment, DocumentCache, OntologyFamily};

use crate::adapters::{AdapterRegistry, FetchContext};
use crate::config::{validate_config_value, EngineSettings, OntoPaths, OntologyConfig};
use crate::error::{OntologyError, OntologyResult};
use crate::importance::{apply_vector_index, select_entities, select_relationships, ImportanceAnalyzer};
use crate::imports::ImportResolver;
use crate::merge::merge;
use crate::report::StageReport;
use crate::rules::RuleEngine;

const PLACEHOLDER_DESCRIPTION: &str =
    "Generic endpoint for relationships whose domain or range could not be determined";

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub source: SourceOntology,
    pub compact: CompactOntology,
    pub reports: Vec<StageReport>,
    pub anomaly: Option<PruningAnomaly>,
    /// Imports skipped during closure resolution, with the reason.
    pub failed_imports: Vec<(String, String)>,
}

impl PipelineOutput {
    /// Write `<name>.source.json` and `<name>.compact.json` into `dir`.
    pub async fn write_artifacts(&self, dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let stem = sanitize_segment(&self.source.name);
        let source_path = dir.join(format!("{}.source.json", stem));
        let compact_path = dir.join(format!("{}.compact.json", stem));

        let source_json = serde_json::to_string_pretty(&self.source)?;
        let compact_json = serde_json::to_string_pretty(&self.compact)?;

        tokio::fs::write(&source_path, source_json)
            .await
            .with_context(|| format!("Failed to write {}", source_path.display()))?;
        tokio::fs::write(&compact_path, compact_json)
            .await
            .with_context(|| format!("Failed to write {}", compact_path.display()))?;

        info!(
            "Wrote {} and {}",
            source_path.display(),
            compact_path.display()
        );
        Ok((source_path, compact_path))
    }
}

/// Runs the extraction chain with shared settings and resources.
pub struct Pipeline {
    registry: AdapterRegistry,
    settings: EngineSettings,
    ctx: FetchContext,
    analyzer: ImportanceAnalyzer,
}

impl Pipeline {
    /// Pipeline with the built-in adapters, cache under the settings' cache
    /// root, and the scorer the settings describe.
    pub fn new(settings: EngineSettings, paths: &OntoPaths) -> OntologyResult<Self> {
        let cache = DocumentCache::new(settings.cache_root(paths));
        let ctx = FetchContext::new(&settings.fetch, Some(cache))?;
        let analyzer = ImportanceAnalyzer::from_settings(&settings)?;
        Ok(Self::with_parts(
            AdapterRegistry::with_builtin(),
            settings,
            ctx,
            analyzer,
        ))
    }

    pub fn with_parts(
        registry: AdapterRegistry,
        settings: EngineSettings,
        ctx: FetchContext,
        analyzer: ImportanceAnalyzer,
    ) -> Self {
        Self {
            registry,
            settings,
            ctx,
            analyzer,
        }
    }

    pub fn registry_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[instrument(skip_all, fields(ontology = %config.name))]
    pub async fn run(&self, config: &OntologyConfig) -> OntologyResult<PipelineOutput> {
        let errors = validate_config_value(&serde_json::to_value(config)?);
        if !errors.is_empty() {
            return Err(OntologyError::ConfigValidation(errors));
        }

        let adapter = self.registry.for_source(&config.source).ok_or_else(|| {
            OntologyError::ConfigValidation(vec![format!(
                "source.type: no adapter for '{}' ({})",
                config.source.kind.as_str(),
                config.source.url
            )])
        })?;
        info!(
            "Extracting {} from {} with the {} adapter",
            config.name,
            config.source.url,
            adapter.name()
        );

        let mut reports = Vec::new();

        // Closure
        let resolver =
            ImportResolver::new(adapter.as_ref(), &self.ctx, self.settings.duplicate_policy);
        let closure = resolver.parse_with_imports(&config.source.url).await?;
        let failed: Vec<String> = closure.failed.iter().map(|(url, _)| url.clone()).collect();
        push_report(
            &mut reports,
            StageReport::new("imports", closure.visited.len(), &failed),
        );

        // Rules
        let family = OntologyFamily::detect(&config.source.url);
        let engine = RuleEngine::for_family(family);
        let entities =
            adapter.extract_entities(&engine, &config.extraction.entities, &closure.ontology);
        let relationships = adapter.extract_relationships(
            &engine,
            &config.extraction.relationships,
            &closure.ontology,
        );
        push_report(
            &mut reports,
            StageReport::new("rules:entities", entities.kept.len(), &entities.filtered),
        );
        push_report(
            &mut reports,
            StageReport::new(
                "rules:relationships",
                relationships.kept.len(),
                &relationships.filtered,
            ),
        );

        let mut extracted = SourceOntology::new(config.name.clone(), config.source.clone());
        extracted.entities = entities.kept;
        extracted.relationships = relationships.kept;
        extracted.metadata = config.metadata.clone();

        // Overrides
        let mut ontology = merge(&extracted, &config.overrides);
        materialize_placeholder(&mut ontology);

        let context = config.context.as_deref().filter(|c| !c.trim().is_empty());
        let mut ignored_entities = Vec::new();
        let mut ignored_relationships = Vec::new();

        // Entity importance
        let max_entities = self.settings.selection.max_entities;
        let entity_scores = self
            .analyzer
            .analyze_entity_importance(&ontology.entities, context, max_entities)
            .await;
        let selection = select_entities(
            std::mem::take(&mut ontology.entities),
            &entity_scores,
            max_entities,
        );
        if !selection.protected.is_empty() {
            debug!(
                "Core whitelist kept {} below the cut: {}",
                selection.protected.len(),
                selection.protected.join(", ")
            );
        }
        push_report(
            &mut reports,
            StageReport::new(
                "importance:entities",
                selection.retained.len(),
                &selection.ignored,
            ),
        );
        ignored_entities.extend(selection.ignored);

        // Naming policy
        let policy = self.settings.naming_policy.build();
        let (mut retained, rejected): (Vec<Entity>, Vec<Entity>) = selection
            .retained
            .into_iter()
            .partition(|e| policy.accepts(&e.name));
        let rejected: Vec<String> = rejected.into_iter().map(|e| e.name).collect();
        push_report(
            &mut reports,
            StageReport::new(&format!("naming:{}", policy.name()), retained.len(), &rejected),
        );
        ignored_entities.extend(rejected);

        // Relationship importance
        let relationships = std::mem::take(&mut ontology.relationships);
        let relationships = match self.settings.selection.max_relationships {
            Some(max) => {
                let scores = self
                    .analyzer
                    .analyze_relationship_importance(&relationships, context, max)
                    .await;
                let (kept, dropped) = select_relationships(relationships, &scores, Some(max));
                push_report(
                    &mut reports,
                    StageReport::new("importance:relationships", kept.len(), &dropped),
                );
                ignored_relationships.extend(dropped);
                kept
            }
            None => relationships,
        };

        // Referential pruning
        let allowed: HashSet<String> = retained.iter().map(|e| e.name.clone()).collect();
        let (kept, pruned) = split_by_endpoints(relationships, &allowed);
        push_report(
            &mut reports,
            StageReport::new("pruning", kept.len(), &pruned),
        );
        ignored_relationships.extend(pruned);
        let anomaly = check_pruning_anomaly(
            kept.len(),
            ignored_relationships.len(),
            &ignored_relationships,
        );

        let flagged = apply_vector_index(&mut retained, &entity_scores, context);
        debug!("{} entities flagged for vector indexing", flagged);

        ontology.entities = retained;
        ontology.relationships = kept;
        ontology.ignored_entities = ignored_entities;
        ontology.ignored_relationships = ignored_relationships;
        ontology.sort_for_output();

        ontology.metadata.last_extraction = Some(Utc::now().to_rfc3339());
        if !config.source.version.is_empty() {
            ontology.metadata.source_version = Some(config.source.version.clone());
        }

        let compact = compact(&ontology);
        info!(
            "{}: {} entities, {} relationships ({} / {} ignored), compact {} / {}",
            ontology.name,
            ontology.entities.len(),
            ontology.relationships.len(),
            ontology.ignored_entities.len(),
            ontology.ignored_relationships.len(),
            compact.e.len(),
            compact.r.len()
        );

        Ok(PipelineOutput {
            source: ontology,
            compact,
            reports,
            anomaly,
            failed_imports: closure.failed,
        })
    }
}

fn push_report(reports: &mut Vec<StageReport>, report: StageReport) {
    report.log();
    reports.push(report);
}

/// Add the placeholder entity when a relationship references it.
fn materialize_placeholder(ontology: &mut SourceOntology) {
    let referenced = ontology
        .relationships
        .iter()
        .any(|r| r.source == PLACEHOLDER_ENTITY || r.target == PLACEHOLDER_ENTITY);
    if referenced && ontology.entity(PLACEHOLDER_ENTITY).is_none() {
        debug!("Adding placeholder entity {}", PLACEHOLDER_ENTITY);
        ontology
            .entities
            .push(Entity::new(PLACEHOLDER_ENTITY, PLACEHOLDER_DESCRIPTION));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoforge_graph::{Relationship, SourceInfo, SourceType};

    #[test]
    fn test_placeholder_materialized_only_when_referenced() {
        let info = SourceInfo {
            url: "onto.owl".to_string(),
            kind: SourceType::Owl,
            version: String::new(),
            description: String::new(),
        };
        let mut ontology = SourceOntology::new("t", info.clone());
        ontology.relationships = vec![Relationship::new("knows", "Person", PLACEHOLDER_ENTITY)];
        materialize_placeholder(&mut ontology);
        materialize_placeholder(&mut ontology);
        assert_eq!(ontology.entity_names(), vec![PLACEHOLDER_ENTITY]);

        let mut plain = SourceOntology::new("t", info);
        plain.relationships = vec![Relationship::new("knows", "Person", "Person")];
        materialize_placeholder(&mut plain);
        assert!(plain.entities.is_empty());
    }
}
