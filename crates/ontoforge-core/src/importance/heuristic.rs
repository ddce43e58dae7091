//! Local heuristic scorer, used whenever the scoring service is unavailable.
//!
//! Score = 0.5 + keyword groups + property count + description length +
//! context overlap, clamped to `[0.1, 1.0]`. Missing descriptions simply
//! contribute nothing.

use super::keywords::KeywordTable;
use super::{relevance_label, ScoreInput, ScoredItem};

pub const BASE_SCORE: f64 = 0.5;
pub const MIN_SCORE: f64 = 0.1;
pub const MAX_SCORE: f64 = 1.0;

const PROPERTY_BOOST_PER_PROPERTY: f64 = 0.02;
const PROPERTY_BOOST_CAP: f64 = 0.1;

/// (minimum description length, boost), largest first.
const DESCRIPTION_BOOSTS: &[(usize, f64)] = &[(200, 0.06), (80, 0.04), (20, 0.02)];

const CONTEXT_BOOST_PER_TOKEN: f64 = 0.05;
const CONTEXT_BOOST_CAP: f64 = 0.15;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "are", "our", "any", "all", "into",
    "about", "their", "its", "has", "have", "not",
];

/// Split an identifier into words: separators, camel-case and acronym
/// boundaries (`HTTPServer_config` -> `HTTP`, `Server`, `config`).
pub fn name_segments(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for part in name.split(|c: char| c == '_' || c == '-' || c.is_whitespace()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = c.is_uppercase()
                && prev.is_some_and(|p| {
                    p.is_lowercase()
                        || p.is_ascii_digit()
                        || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
                });
            if boundary && !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            segments.push(current);
        }
    }
    segments
}

/// Lowercase tokens of a context string worth matching on.
pub fn context_tokens(context: Option<&str>) -> Vec<String> {
    let Some(context) = context else {
        return Vec::new();
    };
    let mut tokens: Vec<String> = Vec::new();
    for token in context
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 3 && !STOPWORDS.contains(&t.as_str()))
    {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Context tokens found in a name (split into words) or description.
pub fn context_overlap(tokens: &[String], name: &str, description: &str) -> Vec<String> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let haystack = format!(
        "{} {} {}",
        name.to_lowercase(),
        name_segments(name).join(" ").to_lowercase(),
        description.to_lowercase()
    );
    tokens
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .cloned()
        .collect()
}

/// Keyword-table driven scorer.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    table: KeywordTable,
}

impl HeuristicScorer {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Score one item. `with_domain` fills `domain_significance` (entities).
    pub fn score(&self, input: &ScoreInput, context: &[String], with_domain: bool) -> ScoredItem {
        let text = format!(
            "{} {} {}",
            input.name,
            name_segments(&input.name).join(" "),
            input.description
        );
        let (keyword_total, hits) = self.table.score(&text);

        let property_boost =
            (input.properties.len() as f64 * PROPERTY_BOOST_PER_PROPERTY).min(PROPERTY_BOOST_CAP);
        let description_len = input.description.trim().chars().count();
        let description_boost = DESCRIPTION_BOOSTS
            .iter()
            .find(|(min, _)| description_len >= *min)
            .map(|(_, boost)| *boost)
            .unwrap_or(0.0);
        let overlap = context_overlap(context, &input.name, &input.description);
        let context_boost = (overlap.len() as f64 * CONTEXT_BOOST_PER_TOKEN).min(CONTEXT_BOOST_CAP);

        let score = (BASE_SCORE + keyword_total + property_boost + description_boost + context_boost)
            .clamp(MIN_SCORE, MAX_SCORE);

        let mut reasons: Vec<String> = hits
            .iter()
            .map(|h| format!("{} {:+.2} ({})", h.group, h.contribution, h.matched.join(", ")))
            .collect();
        if property_boost > 0.0 {
            reasons.push(format!("{} properties {:+.2}", input.properties.len(), property_boost));
        }
        if description_boost > 0.0 {
            reasons.push(format!("description {:+.2}", description_boost));
        }
        if context_boost > 0.0 {
            reasons.push(format!("context ({}) {:+.2}", overlap.join(", "), context_boost));
        }
        let reasoning = if reasons.is_empty() {
            "heuristic: base score".to_string()
        } else {
            format!("heuristic: {}", reasons.join("; "))
        };

        let domain_significance = with_domain.then(|| {
            hits.iter()
                .filter(|h| h.contribution > 0.0)
                .map(|h| h.group.clone())
                .collect::<Vec<_>>()
                .join(", ")
        });

        ScoredItem {
            name: input.name.clone(),
            score,
            reasoning,
            business_relevance: relevance_label(score).to_string(),
            domain_significance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importance::keywords::KeywordGroup;

    fn input(name: &str, description: &str, properties: usize) -> ScoreInput {
        ScoreInput {
            name: name.to_string(),
            description: description.to_string(),
            properties: (0..properties).map(|i| format!("p{}", i)).collect(),
        }
    }

    fn empty_table() -> HeuristicScorer {
        HeuristicScorer::new(KeywordTable { groups: Vec::new() })
    }

    #[test]
    fn test_name_segments() {
        assert_eq!(name_segments("LegalEntity"), vec!["Legal", "Entity"]);
        assert_eq!(name_segments("HTTPServer_config"), vec!["HTTP", "Server", "config"]);
        assert_eq!(name_segments("Person"), vec!["Person"]);
        assert_eq!(name_segments("has-part"), vec!["has", "part"]);
    }

    #[test]
    fn test_base_score_without_signals() {
        let item = empty_table().score(&input("Widget", "", 0), &[], true);
        assert!((item.score - BASE_SCORE).abs() < 1e-9);
        assert_eq!(item.reasoning, "heuristic: base score");
        assert_eq!(item.domain_significance.as_deref(), Some(""));
    }

    #[test]
    fn test_property_and_description_boosts_are_capped() {
        let scorer = empty_table();
        let few = scorer.score(&input("Widget", "", 2), &[], false);
        assert!((few.score - 0.54).abs() < 1e-9);

        let many = scorer.score(&input("Widget", &"x".repeat(250), 20), &[], false);
        assert!((many.score - (0.5 + 0.1 + 0.06)).abs() < 1e-9);
        assert_eq!(many.domain_significance, None);
    }

    #[test]
    fn test_keyword_groups_and_clamp() {
        let scorer = HeuristicScorer::new(KeywordTable {
            groups: vec![
                KeywordGroup::new("core", 0.3, 0.6, &["buyer", "contract"]),
                KeywordGroup::new("admin", -0.3, 0.6, &["code", "status"]),
            ],
        });

        let high = scorer.score(&input("BuyerContract", "", 0), &[], true);
        assert!((high.score - 1.0).abs() < 1e-9);
        assert_eq!(high.domain_significance.as_deref(), Some("core"));
        assert_eq!(high.business_relevance, "high");

        let low = scorer.score(&input("StatusCode", "", 0), &[], true);
        assert!((low.score - MIN_SCORE).abs() < 1e-9);
        assert_eq!(low.business_relevance, "low");
    }

    #[test]
    fn test_context_overlap_boost() {
        let tokens = context_tokens(Some("Trade finance for the shipping industry"));
        assert_eq!(tokens, vec!["trade", "finance", "shipping", "industry"]);

        let scorer = empty_table();
        let item = scorer.score(&input("TradeLetter", "Used in shipping", 0), &tokens, false);
        assert!((item.score - 0.6).abs() < 1e-9);
        assert!(item.reasoning.contains("trade"));
    }
}
