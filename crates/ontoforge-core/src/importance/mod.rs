//! Importance analysis and selection.
//!
//! Entities and relationships are ranked by a salience score in `[0, 1]`.
//! Two scorers share one result type, [`ScoredItem`]:
//!
//! - **Remote**: an optional [`ScoringService`], called once per pass under a
//!   timeout, with a naming-pattern adjustment applied to its scores
//! - **Heuristic**: the local [`HeuristicScorer`], used when there is no
//!   service or the service fails in any way
//!
//! Selection keeps the top `max_count` entities plus the core whitelist.
//! Relationship selection is an optional top-N cut; referential pruning then
//! happens in `ontoforge_graph::prune`.

pub mod heuristic;
pub mod keywords;
pub mod service;

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ontoforge_graph::{compare_names, Entity, Relationship, PLACEHOLDER_ENTITY};

use crate::config::EngineSettings;
use crate::error::OntologyResult;

pub use heuristic::{context_overlap, context_tokens, name_segments, HeuristicScorer};
pub use keywords::{GroupHit, KeywordGroup, KeywordTable};
pub use service::{HttpScoringService, ScoringItem, ScoringRequest, ScoringService, ServiceScore};

/// Domain anchors that survive importance selection whenever present.
pub const CORE_WHITELIST: &[&str] = &[
    "Organization",
    "Person",
    "LegalEntity",
    "Party",
    "Agent",
    "Account",
    "Contract",
    "Agreement",
    "Transaction",
    "Payment",
    "Product",
    "Service",
    "Customer",
    "Address",
    "Location",
    "Event",
    "Document",
];

/// Scores at or above this mark qualify for vector indexing.
pub const VECTOR_INDEX_THRESHOLD: f64 = 0.8;

const SEGMENT_PENALTY: f64 = 0.02;
const SEGMENT_PENALTY_CAP: f64 = 0.1;
const SINGLE_SEGMENT_BONUS: f64 = 0.05;

const ENTITY_PROMPT: &str = "Rank these ontology entities by their importance for modelling the business domain. Return an importanceScore between 0 and 1 for each.";
const RELATIONSHIP_PROMPT: &str = "Rank these ontology relationships by their importance for modelling the business domain. Return an importanceScore between 0 and 1 for each.";

/// The scoring result shared by the remote and heuristic paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    pub name: String,
    pub score: f64,
    pub reasoning: String,
    pub business_relevance: String,
    /// Only set for entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_significance: Option<String>,
}

/// What a scorer sees of one entity or relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInput {
    pub name: String,
    pub description: String,
    pub properties: Vec<String>,
}

impl ScoreInput {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            description: entity.description.clone(),
            properties: entity.properties.keys().cloned().collect(),
        }
    }

    pub fn from_relationship(relationship: &Relationship) -> Self {
        Self {
            name: relationship.name.clone(),
            description: relationship.description.clone(),
            properties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Entity,
    Relationship,
}

impl Subject {
    fn as_str(&self) -> &'static str {
        match self {
            Subject::Entity => "entities",
            Subject::Relationship => "relationships",
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            Subject::Entity => ENTITY_PROMPT,
            Subject::Relationship => RELATIONSHIP_PROMPT,
        }
    }
}

/// Coarse label for a score.
pub fn relevance_label(score: f64) -> &'static str {
    if score >= 0.7 {
        "high"
    } else if score >= 0.4 {
        "medium"
    } else {
        "low"
    }
}

/// Adjustment applied to remote scores: long compound names are nudged down,
/// single-word names up.
pub fn naming_adjustment(name: &str) -> f64 {
    let segments = name_segments(name).len();
    if segments <= 1 {
        SINGLE_SEGMENT_BONUS
    } else {
        -((segments - 1) as f64 * SEGMENT_PENALTY).min(SEGMENT_PENALTY_CAP)
    }
}

/// Sort by score descending, then by name for a stable order.
fn rank(items: &mut [ScoredItem]) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_names(&a.name, &b.name))
    });
}

/// One input per name, first occurrence wins.
fn unique_inputs(inputs: Vec<ScoreInput>) -> Vec<ScoreInput> {
    let mut seen = HashSet::new();
    inputs
        .into_iter()
        .filter(|i| seen.insert(i.name.clone()))
        .collect()
}

/// Ranks entities and relationships.
pub struct ImportanceAnalyzer {
    heuristic: HeuristicScorer,
    service: Option<Arc<dyn ScoringService>>,
    timeout: Duration,
}

impl ImportanceAnalyzer {
    /// Heuristic-only analyzer.
    pub fn new(table: KeywordTable) -> Self {
        Self {
            heuristic: HeuristicScorer::new(table),
            service: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_service(mut self, service: Arc<dyn ScoringService>, timeout: Duration) -> Self {
        self.service = Some(service);
        self.timeout = timeout;
        self
    }

    /// Build from engine settings: keyword table plus the HTTP service when
    /// an endpoint is configured.
    pub fn from_settings(settings: &EngineSettings) -> OntologyResult<Self> {
        let analyzer = Self::new(settings.keyword_table());
        let timeout = Duration::from_secs(settings.scoring.timeout_secs);
        match &settings.scoring.endpoint {
            Some(endpoint) => {
                let service = HttpScoringService::new(endpoint.clone(), timeout)?;
                Ok(analyzer.with_service(Arc::new(service), timeout))
            }
            None => Ok(analyzer),
        }
    }

    pub fn heuristic(&self) -> &HeuristicScorer {
        &self.heuristic
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// Rank entities, highest score first. Never fails.
    pub async fn analyze_entity_importance(
        &self,
        entities: &[Entity],
        context: Option<&str>,
        max_count: usize,
    ) -> Vec<ScoredItem> {
        let inputs = entities.iter().map(ScoreInput::from_entity).collect();
        self.analyze(inputs, context, max_count, Subject::Entity).await
    }

    /// Rank relationships by name, highest score first. Never fails.
    pub async fn analyze_relationship_importance(
        &self,
        relationships: &[Relationship],
        context: Option<&str>,
        max_count: usize,
    ) -> Vec<ScoredItem> {
        let inputs = relationships
            .iter()
            .map(ScoreInput::from_relationship)
            .collect();
        self.analyze(inputs, context, max_count, Subject::Relationship)
            .await
    }

    async fn analyze(
        &self,
        inputs: Vec<ScoreInput>,
        context: Option<&str>,
        max_count: usize,
        subject: Subject,
    ) -> Vec<ScoredItem> {
        let inputs = unique_inputs(inputs);
        if inputs.is_empty() {
            return Vec::new();
        }
        let tokens = context_tokens(context);
        let with_domain = subject == Subject::Entity;

        let remote = self.remote_scores(&inputs, context, max_count, subject).await;

        let mut items: Vec<ScoredItem> = match remote {
            Some(scores) => {
                let by_name: HashMap<&str, &ServiceScore> =
                    scores.iter().map(|s| (s.name.as_str(), s)).collect();
                let mut filled = 0;
                let items = inputs
                    .iter()
                    .map(|input| match by_name.get(input.name.as_str()) {
                        Some(remote) => from_service(remote, with_domain),
                        None => {
                            filled += 1;
                            self.heuristic.score(input, &tokens, with_domain)
                        }
                    })
                    .collect();
                if filled > 0 {
                    debug!(
                        "Scoring service omitted {} {}; filled heuristically",
                        filled,
                        subject.as_str()
                    );
                }
                items
            }
            None => inputs
                .iter()
                .map(|input| self.heuristic.score(input, &tokens, with_domain))
                .collect(),
        };

        rank(&mut items);
        items
    }

    /// Call the service under the timeout; `None` means use the heuristic.
    async fn remote_scores(
        &self,
        inputs: &[ScoreInput],
        context: Option<&str>,
        max_count: usize,
        subject: Subject,
    ) -> Option<Vec<ServiceScore>> {
        let service = self.service.as_ref()?;
        let request = ScoringRequest {
            prompt: subject.prompt().to_string(),
            context: context.map(str::to_string),
            max_count,
            items: inputs
                .iter()
                .map(|i| ScoringItem {
                    name: i.name.clone(),
                    description: i.description.clone(),
                    properties: i.properties.clone(),
                })
                .collect(),
        };

        match tokio::time::timeout(self.timeout, service.score(&request)).await {
            Ok(Ok(scores)) => Some(scores),
            Ok(Err(e)) => {
                info!(
                    "Scoring service {} failed for {}, using heuristic: {}",
                    service.name(),
                    subject.as_str(),
                    e
                );
                None
            }
            Err(_) => {
                info!(
                    "Scoring service {} timed out after {:?} for {}, using heuristic",
                    service.name(),
                    self.timeout,
                    subject.as_str()
                );
                None
            }
        }
    }
}

fn from_service(remote: &ServiceScore, with_domain: bool) -> ScoredItem {
    let raw = if remote.importance_score.is_finite() {
        remote.importance_score
    } else {
        0.0
    };
    let score = (raw + naming_adjustment(&remote.name)).clamp(0.0, 1.0);
    ScoredItem {
        name: remote.name.clone(),
        score,
        reasoning: remote.reasoning.clone().unwrap_or_default(),
        business_relevance: remote
            .business_relevance_label()
            .unwrap_or_else(|| relevance_label(score).to_string()),
        domain_significance: if with_domain {
            Some(remote.domain_significance.clone().unwrap_or_default())
        } else {
            None
        },
    }
}

/// Outcome of entity selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySelection {
    /// Retained entities in their input order.
    pub retained: Vec<Entity>,
    /// Deduplicated, alphabetized names that were dropped.
    pub ignored: Vec<String>,
    /// Whitelisted names kept although they ranked below the cut.
    pub protected: Vec<String>,
}

/// Keep the top `max_count` ranked entities plus every whitelisted name (and
/// the placeholder entity) that is present.
pub fn select_entities(
    entities: Vec<Entity>,
    ranked: &[ScoredItem],
    max_count: usize,
) -> EntitySelection {
    let top: HashSet<&str> = ranked
        .iter()
        .take(max_count)
        .map(|s| s.name.as_str())
        .collect();

    let mut seen = HashSet::new();
    let mut selection = EntitySelection::default();
    for entity in entities {
        if !seen.insert(entity.name.clone()) {
            continue;
        }
        let name = entity.name.as_str();
        if top.contains(name) {
            selection.retained.push(entity);
        } else if CORE_WHITELIST.contains(&name) || name == PLACEHOLDER_ENTITY {
            selection.protected.push(entity.name.clone());
            selection.retained.push(entity);
        } else {
            selection.ignored.push(entity.name);
        }
    }
    selection.ignored = ontoforge_graph::dedup_sorted(selection.ignored);
    selection
}

/// Keep relationships whose name ranks in the top `max_count`; `None` keeps
/// everything. Returns `(kept, ignored names)`.
pub fn select_relationships(
    relationships: Vec<Relationship>,
    ranked: &[ScoredItem],
    max_count: Option<usize>,
) -> (Vec<Relationship>, Vec<String>) {
    let Some(max_count) = max_count else {
        return (relationships, Vec::new());
    };
    let top: HashSet<&str> = ranked
        .iter()
        .take(max_count)
        .map(|s| s.name.as_str())
        .collect();

    let (kept, dropped): (Vec<Relationship>, Vec<Relationship>) = relationships
        .into_iter()
        .partition(|r| top.contains(r.name.as_str()));
    let ignored = ontoforge_graph::dedup_sorted(dropped.into_iter().map(|r| r.name).collect());
    (kept, ignored)
}

/// Whether an entity should carry a vector index.
pub fn should_vector_index(entity: &Entity, score: f64, context: &[String]) -> bool {
    entity.has_label_property()
        && (score >= VECTOR_INDEX_THRESHOLD
            || !context_overlap(context, &entity.name, &entity.description).is_empty())
}

/// Set `vector_index` on every entity; unscored entities count as 0.
/// Returns how many were flagged.
pub fn apply_vector_index(
    entities: &mut [Entity],
    ranked: &[ScoredItem],
    context: Option<&str>,
) -> usize {
    let scores: HashMap<&str, f64> = ranked.iter().map(|s| (s.name.as_str(), s.score)).collect();
    let tokens = context_tokens(context);
    let mut flagged = 0;
    for entity in entities.iter_mut() {
        let score = scores.get(entity.name.as_str()).copied().unwrap_or(0.0);
        entity.vector_index = should_vector_index(entity, score, &tokens);
        if entity.vector_index {
            flagged += 1;
        }
    }
    flagged
}
