//! RDF/XML and Turtle reading into the uniform node tree.
//!
//! Real-world ontology hosts return all sorts of bodies: HTML error pages,
//! XML with entities declared in an external DTD we never see, Turtle served
//! as `application/rdf+xml`. `parse_rdf` never fails; anything it cannot
//! salvage becomes an empty document and a warning, so one bad import does
//! not void a whole closure.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use oxrdf::{Subject, Term};
use oxttl::TurtleParser;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::document::{compact_iri, namespace_uri, qualified_name, Node};
use crate::error::ParseError;

/// Bodies shorter than this (after trimming) cannot hold an ontology.
pub const MIN_DOCUMENT_LEN: usize = 50;

/// How much of the body is inspected for HTML markers.
const HTML_SNIFF_BYTES: usize = 1024;

/// How many non-empty lines are inspected when sniffing the format.
const FORMAT_SNIFF_LINES: usize = 20;

const XML_ESCAPES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

const TYPOGRAPHIC_ENTITIES: &[(&str, &str)] = &[
    ("nbsp", "&#160;"),
    ("mdash", "&#8212;"),
    ("ndash", "&#8211;"),
    ("lsquo", "&#8216;"),
    ("rsquo", "&#8217;"),
    ("ldquo", "&#8220;"),
    ("rdquo", "&#8221;"),
    ("hellip", "&#8230;"),
    ("copy", "&#169;"),
    ("reg", "&#174;"),
    ("trade", "&#8482;"),
];

const PREFIX_ENTITIES: &[&str] = &["rdf", "rdfs", "owl", "xsd", "skos", "dc", "dcterms"];

static ENTITY_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z_][A-Za-z0-9._-]*);").expect("valid entity regex"));

static ENTITY_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!ENTITY\s+([A-Za-z_][A-Za-z0-9._-]*)\s").expect("valid entity decl regex")
});

/// Serialization of an RDF document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    RdfXml,
    Turtle,
}

impl RdfFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RdfFormat::RdfXml => "rdf/xml",
            RdfFormat::Turtle => "turtle",
        }
    }
}

/// A parsed RDF document.
#[derive(Debug, Clone)]
pub struct RdfDocument {
    pub root: Node,
    /// Base IRI used to resolve `rdf:ID` and relative references.
    pub base: String,
    /// `None` when nothing could be parsed.
    pub format: Option<RdfFormat>,
}

impl RdfDocument {
    pub fn empty(base: &str) -> Self {
        Self {
            root: Node::new("rdf:RDF"),
            base: base.to_string(),
            format: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

fn head(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// True if the body looks like an HTML page rather than RDF.
pub fn looks_like_html(text: &str) -> bool {
    let head = head(text, HTML_SNIFF_BYTES).to_lowercase();
    head.contains("<!doctype html") || head.contains("<html")
}

/// Guess the serialization from the first lines of the body.
///
/// Turtle is chosen only when there is no XML marker and at least one
/// directive or comment line.
pub fn sniff_format(text: &str) -> RdfFormat {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(FORMAT_SNIFF_LINES)
        .collect();

    let has_xml = lines
        .iter()
        .any(|l| l.starts_with("<?xml") || l.contains("<rdf:RDF") || l.contains("xmlns"));
    if has_xml {
        return RdfFormat::RdfXml;
    }

    let has_turtle = lines.iter().any(|l| {
        let upper = l.to_ascii_uppercase();
        l.starts_with("@prefix")
            || l.starts_with("@base")
            || upper.starts_with("PREFIX ")
            || upper.starts_with("BASE ")
            || l.starts_with('#')
    });
    if has_turtle {
        RdfFormat::Turtle
    } else {
        RdfFormat::RdfXml
    }
}

/// Rewrite entity references the XML parser would reject.
///
/// Standard escapes and entities declared in the document's own DTD are kept.
/// Known typographic entities become numeric references, namespace-prefix
/// entities become their namespace URI, and everything else is dropped.
pub fn sanitize_entities(text: &str) -> String {
    let declared: HashSet<&str> = ENTITY_DECL
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    ENTITY_REF
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            if XML_ESCAPES.contains(&name) || declared.contains(name) {
                return caps[0].to_string();
            }
            if let Some((_, replacement)) = TYPOGRAPHIC_ENTITIES.iter().find(|(n, _)| *n == name)
            {
                return replacement.to_string();
            }
            if PREFIX_ENTITIES.contains(&name) {
                if let Some(uri) = namespace_uri(name) {
                    return uri.to_string();
                }
            }
            debug!("Dropping undeclared entity &{};", name);
            String::new()
        })
        .into_owned()
}

/// Parse RDF/XML into a node tree rooted at the document element.
pub fn parse_xml(text: &str) -> Result<Node, ParseError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;
    Ok(convert_element(doc.root_element()))
}

fn convert_element(element: roxmltree::Node) -> Node {
    let tag = element.tag_name();
    let mut node = Node::new(qualified_name(tag.namespace(), tag.name()));

    for attr in element.attributes() {
        node.attributes.insert(
            qualified_name(attr.namespace(), attr.name()),
            attr.value().to_string(),
        );
    }

    let mut text = String::new();
    for child in element.children() {
        if child.is_element() {
            node.children.push(convert_element(child));
        } else if let Some(t) = child.text().filter(|_| child.is_text()) {
            text.push_str(t);
        }
    }
    node.text = text.trim().to_string();
    node
}

/// Parse Turtle, grouping triples into one `rdf:Description` per subject.
pub fn parse_turtle(text: &str, base: Option<&str>) -> Result<Node, ParseError> {
    let parser = base
        .and_then(|b| TurtleParser::new().with_base_iri(b).ok())
        .unwrap_or_else(TurtleParser::new);

    let mut root = Node::new("rdf:RDF");
    let mut index: HashMap<String, usize> = HashMap::new();

    for triple in parser.for_reader(text.as_bytes()) {
        let triple = triple.map_err(|e| ParseError::Turtle(e.to_string()))?;

        let Some((key, subject_attr, subject_value)) = subject_parts(&triple.subject) else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            root.children
                .push(Node::new("rdf:Description").with_attr(subject_attr, subject_value));
            root.children.len() - 1
        });

        let mut property = Node::new(compact_iri(triple.predicate.as_str()));
        #[allow(unreachable_patterns)]
        match &triple.object {
            Term::NamedNode(n) => {
                property
                    .attributes
                    .insert("rdf:resource".to_string(), n.as_str().to_string());
            }
            Term::BlankNode(b) => {
                property
                    .attributes
                    .insert("rdf:nodeID".to_string(), b.as_str().to_string());
            }
            Term::Literal(lit) => {
                property.text = lit.value().to_string();
                if let Some(lang) = lit.language() {
                    property
                        .attributes
                        .insert("xml:lang".to_string(), lang.to_string());
                }
            }
            _ => continue,
        }
        root.children[slot].children.push(property);
    }

    Ok(root)
}

#[allow(unreachable_patterns)]
fn subject_parts(subject: &Subject) -> Option<(String, &'static str, String)> {
    match subject {
        Subject::NamedNode(n) => Some((n.as_str().to_string(), "rdf:about", n.as_str().to_string())),
        Subject::BlankNode(b) => Some((
            format!("_:{}", b.as_str()),
            "rdf:nodeID",
            b.as_str().to_string(),
        )),
        _ => None,
    }
}

/// Parse an RDF document of unknown serialization.
///
/// Never fails: HTML pages, short bodies and unparseable content all yield
/// an empty document with a warning.
pub fn parse_rdf(text: &str, url: &str) -> RdfDocument {
    if looks_like_html(text) {
        warn!("Skipping {}: body is an HTML page, not RDF", url);
        return RdfDocument::empty(url);
    }
    if text.trim().len() < MIN_DOCUMENT_LEN {
        warn!("Skipping {}: body too short ({} bytes)", url, text.trim().len());
        return RdfDocument::empty(url);
    }

    if sniff_format(text) == RdfFormat::Turtle {
        match parse_turtle(text, Some(url)) {
            Ok(root) => {
                debug!("Parsed {} as Turtle ({} subjects)", url, root.children.len());
                return RdfDocument {
                    root,
                    base: url.to_string(),
                    format: Some(RdfFormat::Turtle),
                };
            }
            Err(e) => warn!("Turtle parse failed for {}: {}; retrying as RDF/XML", url, e),
        }
    }

    let sanitized = sanitize_entities(text);
    match parse_xml(&sanitized) {
        Ok(root) => {
            let base = root.attr("xml:base").unwrap_or(url).to_string();
            debug!("Parsed {} as RDF/XML ({} top-level nodes)", url, root.children.len());
            RdfDocument {
                root,
                base,
                format: Some(RdfFormat::RdfXml),
            }
        }
        Err(e) => {
            warn!("Could not parse {} as RDF/XML: {}", url, e);
            RdfDocument::empty(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWL_XML: &str = r#"<?xml version="1.0"?>
<!DOCTYPE rdf:RDF [
    <!ENTITY owl "http://www.w3.org/2002/07/owl#" >
]>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:o="http://www.w3.org/2002/07/owl#"
         xml:base="http://example.org/onto">
    <o:Class rdf:about="http://example.org/onto#Person">
        <rdfs:subClassOf rdf:resource="&owl;Thing"/>
        <rdfs:comment>A human being&mdash;living or dead&unknown;.</rdfs:comment>
    </o:Class>
</rdf:RDF>"#;

    #[test]
    fn test_rejects_html_and_short_bodies() {
        let html = "<!DOCTYPE html><html><body>404 Not Found</body></html>".repeat(3);
        assert!(looks_like_html(&html));
        assert!(parse_rdf(&html, "http://example.org/x").is_empty());

        let short = "@prefix ex: <http://e/> .";
        let doc = parse_rdf(short, "http://example.org/x");
        assert!(doc.is_empty());
        assert_eq!(doc.format, None);
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(OWL_XML), RdfFormat::RdfXml);
        assert_eq!(
            sniff_format("# comment\n@prefix owl: <http://www.w3.org/2002/07/owl#> ."),
            RdfFormat::Turtle
        );
        assert_eq!(
            sniff_format("PREFIX ex: <http://example.org/>\nex:a a ex:B ."),
            RdfFormat::Turtle
        );
        // No markers at all defaults to XML
        assert_eq!(sniff_format("ex:a ex:b ex:c ."), RdfFormat::RdfXml);
    }

    #[test]
    fn test_sanitize_entities() {
        let input = "&amp; &lt; &#65; &nbsp; &owl;Thing &bogus; &declared;<!ENTITY declared \"x\">";
        let out = sanitize_entities(input);
        assert_eq!(
            out,
            "&amp; &lt; &#65; &#160; http://www.w3.org/2002/07/owl#Thing  &declared;<!ENTITY declared \"x\">"
        );
    }

    #[test]
    fn test_parse_xml_canonicalizes_prefixes() {
        let doc = parse_rdf(OWL_XML, "http://example.org/onto.owl");
        assert_eq!(doc.format, Some(RdfFormat::RdfXml));
        assert_eq!(doc.base, "http://example.org/onto");

        let class = doc.root.child("owl:Class").unwrap();
        assert_eq!(class.attr("rdf:about"), Some("http://example.org/onto#Person"));
        assert_eq!(
            class.child_resource("rdfs:subClassOf"),
            Some("http://www.w3.org/2002/07/owl#Thing")
        );
        assert_eq!(
            class.child_text("rdfs:comment"),
            Some("A human being\u{2014}living or dead.")
        );
    }

    #[test]
    fn test_parse_turtle_groups_by_subject() {
        let ttl = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://example.org/onto#> .

ex:Person a owl:Class ;
    rdfs:label "Person"@en ;
    rdfs:subClassOf [ a owl:Restriction ] .
"#;
        let doc = parse_rdf(ttl, "http://example.org/onto.ttl");
        assert_eq!(doc.format, Some(RdfFormat::Turtle));

        let person = doc
            .root
            .children
            .iter()
            .find(|n| n.attr("rdf:about") == Some("http://example.org/onto#Person"))
            .unwrap();
        assert!(person.is("rdf:Description"));
        assert_eq!(
            person.child_resource("rdf:type"),
            Some("http://www.w3.org/2002/07/owl#Class")
        );
        let label = person.child("rdfs:label").unwrap();
        assert_eq!(label.text, "Person");
        assert_eq!(label.attr("xml:lang"), Some("en"));
        assert!(person.child("rdfs:subClassOf").unwrap().attr("rdf:nodeID").is_some());

        // The blank node restriction is its own description
        assert!(doc.root.children.iter().any(|n| n.attr("rdf:nodeID").is_some()));
    }

    #[test]
    fn test_broken_turtle_degrades_to_empty() {
        let broken = "@prefix ex: <http://example.org/> .\nex:a ex:b \"unterminated .\n# trailing comment line";
        let doc = parse_rdf(broken, "http://example.org/broken.ttl");
        assert!(doc.is_empty());
        assert_eq!(doc.format, None);
    }
}
