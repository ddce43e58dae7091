//! Referential pruning of relationships.
//!
//! A relationship survives only if both its endpoints are retained entity
//! names. Losing every relationship is almost always a sign that an earlier
//! stage dropped the wrong entities, so that case is reported loudly (but
//! never fails the run).

use std::collections::HashSet;

use tracing::{error, warn};

use crate::schema::Relationship;

/// Fraction of ignored relationships above which a warning is emitted.
pub const HIGH_LOSS_RATIO: f64 = 0.5;

/// How many pruned names to carry in diagnostics.
pub const ANOMALY_SAMPLE_SIZE: usize = 10;

/// A non-fatal diagnostic produced by a pruning pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PruningAnomaly {
    /// Nothing survived although there was something to keep.
    AllRelationshipsPruned { total: usize, sample: Vec<String> },
    /// More than half of the relationships were ignored.
    HighLoss {
        kept: usize,
        ignored: usize,
        percent: f64,
    },
}

impl PruningAnomaly {
    pub fn is_critical(&self) -> bool {
        matches!(self, PruningAnomaly::AllRelationshipsPruned { .. })
    }
}

/// Outcome of a referential pruning pass.
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub kept: Vec<Relationship>,
    /// One entry per pruned relationship, in input order.
    pub pruned_names: Vec<String>,
    pub anomaly: Option<PruningAnomaly>,
}

/// Split relationships into those with both endpoints in `allowed` and the
/// names of the rest. No diagnostics.
pub fn split_by_endpoints(
    relationships: Vec<Relationship>,
    allowed: &HashSet<String>,
) -> (Vec<Relationship>, Vec<String>) {
    let mut kept = Vec::with_capacity(relationships.len());
    let mut pruned_names = Vec::new();

    for relationship in relationships {
        if allowed.contains(&relationship.source) && allowed.contains(&relationship.target) {
            kept.push(relationship);
        } else {
            pruned_names.push(relationship.name);
        }
    }
    (kept, pruned_names)
}

/// Keep relationships whose `source` and `target` are both in `allowed`.
pub fn prune_relationships(
    relationships: Vec<Relationship>,
    allowed: &HashSet<String>,
) -> PruneReport {
    let (kept, pruned_names) = split_by_endpoints(relationships, allowed);
    let anomaly = check_pruning_anomaly(kept.len(), pruned_names.len(), &pruned_names);
    PruneReport {
        kept,
        pruned_names,
        anomaly,
    }
}

/// Inspect kept/ignored totals and log a diagnostic when something looks off.
///
/// `ignored` may include relationships dropped by earlier stages; `sample`
/// only needs to hold a few representative names.
pub fn check_pruning_anomaly(
    kept: usize,
    ignored: usize,
    sample: &[String],
) -> Option<PruningAnomaly> {
    let total = kept + ignored;
    if total == 0 {
        return None;
    }

    let sample: Vec<String> = sample.iter().take(ANOMALY_SAMPLE_SIZE).cloned().collect();

    if kept == 0 {
        error!(
            "CRITICAL: all {} relationships were pruned; no relationship has both endpoints retained. Sample: {:?}",
            total, sample
        );
        return Some(PruningAnomaly::AllRelationshipsPruned { total, sample });
    }

    let ratio = ignored as f64 / total as f64;
    if ratio > HIGH_LOSS_RATIO {
        let percent = ratio * 100.0;
        warn!(
            "{:.1}% of relationships were ignored ({} kept, {} ignored). Sample: {:?}",
            percent, kept, ignored, sample
        );
        return Some(PruningAnomaly::HighLoss {
            kept,
            ignored,
            percent,
        });
    }

    None
}
