//! Ontology family detection.
//!
//! A family groups documents published by the same standards body. It
//! namespaces the content cache and selects default extraction rules.

use serde::{Deserialize, Serialize};

/// Known ontology families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OntologyFamily {
    /// EDM Council Financial Industry Business Ontology
    Fibo,
    /// CIDOC Conceptual Reference Model (and Erlangen CRM)
    CidocCrm,
    SchemaOrg,
    Foaf,
    DublinCore,
    Prov,
    Skos,
    Other,
}

/// URL substrings that identify each family.
const FAMILY_PATTERNS: &[(OntologyFamily, &[&str])] = &[
    (OntologyFamily::Fibo, &["edmcouncil.org/fibo", "/fibo/", "fibo"]),
    (
        OntologyFamily::CidocCrm,
        &["cidoc-crm.org", "erlangen-crm.org", "cidoc"],
    ),
    (OntologyFamily::SchemaOrg, &["schema.org"]),
    (OntologyFamily::Foaf, &["xmlns.com/foaf"]),
    (OntologyFamily::DublinCore, &["purl.org/dc/", "dublincore.org"]),
    (OntologyFamily::Prov, &["w3.org/ns/prov"]),
    (OntologyFamily::Skos, &["w3.org/2004/02/skos"]),
];

impl OntologyFamily {
    /// Detect the family a URL belongs to.
    pub fn detect(url: &str) -> Self {
        let url = url.to_lowercase();
        FAMILY_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| url.contains(p)))
            .map(|(family, _)| *family)
            .unwrap_or(OntologyFamily::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OntologyFamily::Fibo => "fibo",
            OntologyFamily::CidocCrm => "cidoc_crm",
            OntologyFamily::SchemaOrg => "schema_org",
            OntologyFamily::Foaf => "foaf",
            OntologyFamily::DublinCore => "dublin_core",
            OntologyFamily::Prov => "prov",
            OntologyFamily::Skos => "skos",
            OntologyFamily::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fibo" => Some(OntologyFamily::Fibo),
            "cidoc_crm" => Some(OntologyFamily::CidocCrm),
            "schema_org" => Some(OntologyFamily::SchemaOrg),
            "foaf" => Some(OntologyFamily::Foaf),
            "dublin_core" => Some(OntologyFamily::DublinCore),
            "prov" => Some(OntologyFamily::Prov),
            "skos" => Some(OntologyFamily::Skos),
            "other" => Some(OntologyFamily::Other),
            _ => None,
        }
    }

    /// Namespace keywords a document URI must contain to be kept by default.
    pub fn namespace_keywords(&self) -> &'static [&'static str] {
        match self {
            OntologyFamily::Fibo => &["fibo"],
            OntologyFamily::CidocCrm => &["cidoc", "erlangen-crm"],
            OntologyFamily::SchemaOrg => &["schema.org"],
            OntologyFamily::Foaf => &["foaf"],
            OntologyFamily::DublinCore => &["purl.org/dc"],
            OntologyFamily::Prov => &["prov"],
            OntologyFamily::Skos => &["skos"],
            OntologyFamily::Other => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(
            OntologyFamily::detect(
                "https://spec.edmcouncil.org/fibo/ontology/BE/LegalEntities/LegalPersons/"
            ),
            OntologyFamily::Fibo
        );
        assert_eq!(
            OntologyFamily::detect("http://www.cidoc-crm.org/cidoc-crm/7.1.1/"),
            OntologyFamily::CidocCrm
        );
        assert_eq!(
            OntologyFamily::detect("https://schema.org/version/latest/schemaorg.ttl"),
            OntologyFamily::SchemaOrg
        );
        assert_eq!(
            OntologyFamily::detect("/tmp/local/ontology.owl"),
            OntologyFamily::Other
        );
    }

    #[test]
    fn test_family_roundtrip() {
        for family in [
            OntologyFamily::Fibo,
            OntologyFamily::CidocCrm,
            OntologyFamily::SchemaOrg,
            OntologyFamily::Foaf,
            OntologyFamily::DublinCore,
            OntologyFamily::Prov,
            OntologyFamily::Skos,
            OntologyFamily::Other,
        ] {
            assert_eq!(OntologyFamily::parse(family.as_str()), Some(family));
        }
    }

    #[test]
    fn test_other_has_no_default_keywords() {
        assert!(OntologyFamily::Other.namespace_keywords().is_empty());
        assert_eq!(OntologyFamily::Fibo.namespace_keywords(), &["fibo"]);
    }
}
