//! Weighted keyword groups driving the heuristic scorer.
//!
//! The table is plain data: it can be replaced from `ontoforge.toml`, and
//! each group's contribution can be tested in isolation.

use serde::{Deserialize, Serialize};

use super::heuristic::name_segments;

/// Space-padded lowercase words of `text`: each alphanumeric run as written,
/// then its camel-case segments when it has more than one.
fn word_text(text: &str) -> String {
    let mut words = Vec::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let segments = name_segments(token);
        if segments.len() > 1 {
            words.push(token.to_lowercase());
        }
        words.extend(segments.iter().map(|s| s.to_lowercase()));
    }
    format!(" {} ", words.join(" "))
}

/// Whether `keyword` (possibly several words) occurs as whole words in a
/// [`word_text`] string, allowing a plural `s`/`es`.
fn contains_words(words: &str, keyword: &str) -> bool {
    ["", "s", "es"]
        .iter()
        .any(|suffix| words.contains(&format!(" {}{} ", keyword, suffix)))
}

/// One group of related keywords.
///
/// Each matching keyword adds `weight` (negative for penalties). The group's
/// total contribution is capped at `cap` in absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub weight: f64,
    pub cap: f64,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new(name: &str, weight: f64, cap: f64, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            cap: cap.abs(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Keywords of this group that occur in `text` as whole words or
    /// camel-case segments.
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let words = word_text(text);
        self.keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty() && contains_words(&words, &k.to_lowercase()))
            .collect()
    }

    /// Capped contribution of this group to a score.
    pub fn contribution(&self, text: &str) -> f64 {
        let raw = self.matches(text).len() as f64 * self.weight;
        raw.clamp(-self.cap, self.cap)
    }
}

/// The full set of keyword groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub groups: Vec<KeywordGroup>,
}

/// Per-group result of scoring one text.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHit {
    pub group: String,
    pub contribution: f64,
    pub matched: Vec<String>,
}

impl KeywordTable {
    /// Built-in table tuned for business-domain ontologies.
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                KeywordGroup::new(
                    "core_organization",
                    0.08,
                    0.2,
                    &[
                        "organization", "organisation", "company", "corporation", "business",
                        "legalentity", "legal entity", "institution", "enterprise", "subsidiary",
                    ],
                ),
                KeywordGroup::new(
                    "core_person",
                    0.08,
                    0.2,
                    &[
                        "person", "customer", "client", "employee", "party", "buyer", "seller",
                        "supplier", "vendor", "agent", "owner", "investor",
                    ],
                ),
                KeywordGroup::new(
                    "core_financial",
                    0.07,
                    0.2,
                    &[
                        "account", "payment", "transaction", "contract", "agreement", "invoice",
                        "loan", "security", "asset", "fund", "price", "currency", "deal",
                        "instrument", "portfolio", "balance",
                    ],
                ),
                KeywordGroup::new(
                    "core_workflow",
                    0.06,
                    0.15,
                    &[
                        "order", "process", "project", "task", "event", "activity", "service",
                        "product", "offer", "purchase", "sale",
                    ],
                ),
                KeywordGroup::new(
                    "administrative",
                    -0.06,
                    0.15,
                    &[
                        "identifier", "code", "registry", "registration", "record", "metadata",
                        "annotation", "status", "version", "revision",
                    ],
                ),
                KeywordGroup::new(
                    "regulatory",
                    -0.05,
                    0.15,
                    &[
                        "regulation", "regulatory", "jurisdiction", "compliance", "statute",
                        "directive", "license", "licence", "authority",
                    ],
                ),
                KeywordGroup::new(
                    "peripheral",
                    -0.05,
                    0.15,
                    &[
                        "abstract", "auxiliary", "deprecated", "temporary", "miscellaneous",
                        "placeholder", "internal", "technical", "unknown",
                    ],
                ),
                KeywordGroup::new(
                    "descriptive",
                    -0.04,
                    0.1,
                    &[
                        "characteristic", "attribute", "quality", "qualifier", "aspect",
                        "dimension", "descriptor", "classifier", "label", "appellation",
                    ],
                ),
            ],
        }
    }

    /// Sum of all group contributions for `text`, plus the groups that fired.
    pub fn score(&self, text: &str) -> (f64, Vec<GroupHit>) {
        let mut total = 0.0;
        let mut hits = Vec::new();
        for group in &self.groups {
            let matched = group.matches(text);
            if matched.is_empty() {
                continue;
            }
            let contribution = group.contribution(text);
            total += contribution;
            hits.push(GroupHit {
                group: group.name.clone(),
                contribution,
                matched: matched.into_iter().map(str::to_string).collect(),
            });
        }
        (total, hits)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}
