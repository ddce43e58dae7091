//! Deep merge of config overrides onto extracted data.
//!
//! Existing entries are merged field by field:
//! - `properties` merges recursively (nested objects merge, scalars and
//!   arrays replace)
//! - `keyProperties` is replaced wholesale when given
//! - `vectorIndex` takes the override value when it is not null
//!
//! Keys absent from the source become new entries, verbatim. The source is
//! never mutated, and merging empty overrides returns an equal structure.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use ontoforge_graph::SourceOntology;

use crate::config::Overrides;

/// Recursively merge `patch` into `base`. Nulls in `patch` are ignored.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        if !value.is_null() {
                            base.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Apply one override object to one serialized entry.
fn merge_entry(base: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, value) in patch {
        match field.as_str() {
            // The map key is the identity; a patch cannot rename
            "name" => {}
            "keyProperties" | "vectorIndex" => {
                if !value.is_null() {
                    base.insert(field.clone(), value.clone());
                }
            }
            _ => match base.get_mut(field) {
                Some(existing) => deep_merge(existing, value),
                None if !value.is_null() => {
                    base.insert(field.clone(), value.clone());
                }
                None => {}
            },
        }
    }
}

/// Merge `patch` onto `item` through its JSON form. On a type mismatch the
/// original is kept and a warning logged.
fn merge_typed<T: Serialize + DeserializeOwned + Clone>(
    item: &T,
    patch: &Map<String, Value>,
    label: &str,
) -> T {
    let mut value = match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map,
        _ => return item.clone(),
    };
    merge_entry(&mut value, patch);
    match serde_json::from_value(Value::Object(value)) {
        Ok(merged) => merged,
        Err(e) => {
            warn!("Ignoring override for {}: {}", label, e);
            item.clone()
        }
    }
}

/// Build a new entry from an override, taking the name from the key.
fn new_typed<T: DeserializeOwned>(key: &str, patch: &Map<String, Value>) -> Option<T> {
    let mut object = patch.clone();
    let has_name = object
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.is_empty());
    if !has_name {
        object.insert("name".to_string(), Value::String(key.to_string()));
    }
    match serde_json::from_value(Value::Object(object)) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!("Ignoring new override entry {}: {}", key, e);
            None
        }
    }
}

/// Return `source` with `overrides` applied.
pub fn merge(source: &SourceOntology, overrides: &Overrides) -> SourceOntology {
    let mut merged = source.clone();
    let mut updated = 0;
    let mut added = 0;

    for (key, patch) in &overrides.entities {
        let Some(patch) = patch.as_object() else {
            warn!("Ignoring non-object entity override {}", key);
            continue;
        };
        match merged.entities.iter_mut().find(|e| &e.name == key) {
            Some(entity) => {
                *entity = merge_typed(entity, patch, key);
                updated += 1;
            }
            None => {
                if let Some(entity) = new_typed(key, patch) {
                    merged.entities.push(entity);
                    added += 1;
                }
            }
        }
    }

    for (key, patch) in &overrides.relationships {
        let Some(patch) = patch.as_object() else {
            warn!("Ignoring non-object relationship override {}", key);
            continue;
        };
        let mut matched = false;
        for relationship in merged.relationships.iter_mut().filter(|r| &r.name == key) {
            *relationship = merge_typed(relationship, patch, key);
            matched = true;
            updated += 1;
        }
        if !matched {
            if let Some(relationship) = new_typed(key, patch) {
                merged.relationships.push(relationship);
                added += 1;
            }
        }
    }

    let backfilled: usize = merged
        .entities
        .iter_mut()
        .map(|e| e.backfill_key_properties())
        .sum();

    if updated + added + backfilled > 0 {
        info!(
            "Overrides: {} updated, {} added, {} key properties backfilled",
            updated, added, backfilled
        );
    }

    merged
}
