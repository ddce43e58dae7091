//! Entity name canonicalization and sink naming policies.
//!
//! Raw identifiers come out of URIs in many shapes (`E22_Man-Made_Object`,
//! `legal-entity`, `Person`). `normalize_entity_name` folds them into one
//! PascalCase form. Whether a name is acceptable for the final artifact is a
//! separate question answered by a `SinkNamingPolicy`, because the constraint
//! comes from whichever consumer reads the output.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_CLASS_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^E\d+_").expect("valid numeric class prefix regex"));

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));

/// Keywords a code-generating consumer cannot use as a symbol name.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "arguments", "await", "boolean", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "debugger", "default", "delete", "do", "double", "else",
    "enum", "eval", "export", "extends", "false", "final", "finally", "float", "for",
    "function", "goto", "if", "implements", "import", "in", "instanceof", "int",
    "interface", "let", "long", "native", "new", "null", "package", "private", "protected",
    "public", "return", "short", "static", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "true", "try", "typeof", "undefined", "var", "void",
    "volatile", "while", "with", "yield",
];

/// Canonicalize a raw identifier extracted from a URI.
///
/// Strips a leading `E<digits>_` class prefix, then joins `_`/`-` separated
/// segments as PascalCase. Names without prefix or separators are returned
/// unchanged; `None` and empty input yield `None`.
pub fn normalize_entity_name(name: Option<&str>) -> Option<String> {
    let name = name?.trim();
    if name.is_empty() {
        return None;
    }

    let stripped = NUMERIC_CLASS_PREFIX.replace(name, "");
    if !stripped.contains(['_', '-']) {
        return non_empty(stripped.into_owned());
    }

    let joined: String = stripped
        .split(['_', '-'])
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect();
    non_empty(joined)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `name` can be used as a symbol by a code-generating consumer.
pub fn is_valid_entity_name(name: &str) -> bool {
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    IDENTIFIER.is_match(name) && !RESERVED_KEYWORDS.contains(&name)
}

/// Decides which entity names may appear in the final artifact.
pub trait SinkNamingPolicy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn accepts(&self, name: &str) -> bool;
}

/// Identifier rules for code-generation consumers (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierPolicy;

impl SinkNamingPolicy for IdentifierPolicy {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn accepts(&self, name: &str) -> bool {
        is_valid_entity_name(name)
    }
}

/// Accepts any non-blank name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissivePolicy;

impl SinkNamingPolicy for PermissivePolicy {
    fn name(&self) -> &'static str {
        "permissive"
    }

    fn accepts(&self, name: &str) -> bool {
        !name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_numeric_prefix() {
        assert_eq!(normalize_entity_name(Some("E55_Type")).as_deref(), Some("Type"));
        assert_eq!(
            normalize_entity_name(Some("E22_Man-Made_Object")).as_deref(),
            Some("ManMadeObject")
        );
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize_entity_name(Some("Person")).as_deref(), Some("Person"));
        assert_eq!(
            normalize_entity_name(Some("LegalEntity")).as_deref(),
            Some("LegalEntity")
        );
        // Only `E<digits>_` counts as a prefix
        assert_eq!(normalize_entity_name(Some("Event")).as_deref(), Some("Event"));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(
            normalize_entity_name(Some("legal-entity")).as_deref(),
            Some("LegalEntity")
        );
        assert_eq!(
            normalize_entity_name(Some("contract__party_")).as_deref(),
            Some("ContractParty")
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_entity_name(None), None);
        assert_eq!(normalize_entity_name(Some("")), None);
        assert_eq!(normalize_entity_name(Some("_-_")), None);
    }

    #[test]
    fn test_is_valid_entity_name() {
        assert!(is_valid_entity_name("Person"));
        assert!(is_valid_entity_name("_private"));
        assert!(is_valid_entity_name("$ref"));
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("123"));
        assert!(!is_valid_entity_name("9Lives"));
        assert!(!is_valid_entity_name("Man-Made"));
        assert!(!is_valid_entity_name("class"));
        assert!(!is_valid_entity_name("Legal Entity"));
    }

    #[test]
    fn test_policies() {
        assert!(IdentifierPolicy.accepts("Contract"));
        assert!(!IdentifierPolicy.accepts("new"));
        assert!(PermissivePolicy.accepts("new"));
        assert!(!PermissivePolicy.accepts("  "));
    }
}
