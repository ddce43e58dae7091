//! Uniform node tree shared by the RDF/XML and Turtle readers.
//!
//! Element and attribute names are canonical qualified names (`owl:Class`,
//! `rdf:about`) no matter which prefix the source document bound, so
//! extraction code can match on fixed strings. Names in namespaces we do not
//! know are kept as full IRIs.

use std::collections::BTreeMap;

/// Namespaces with a canonical prefix.
pub const NAMESPACES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
];

/// Namespace URI for a canonical prefix.
pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Canonical name for `local` in namespace `namespace`.
pub fn qualified_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        None | Some("") => local.to_string(),
        Some(ns) => match NAMESPACES.iter().find(|(_, uri)| *uri == ns) {
            Some((prefix, _)) => format!("{}:{}", prefix, local),
            None => format!("{}{}", ns, local),
        },
    }
}

/// Canonical name for a full IRI: known namespaces are compacted, anything
/// else is returned as is.
pub fn compact_iri(iri: &str) -> String {
    for (prefix, uri) in NAMESPACES {
        if let Some(local) = iri.strip_prefix(uri) {
            if !local.is_empty() {
                return format!("{}:{}", prefix, local);
            }
        }
    }
    iri.to_string()
}

/// Full IRI for a canonical name; names without a known prefix pass through.
pub fn expand_qname(name: &str) -> String {
    if let Some((prefix, local)) = name.split_once(':') {
        if let Some(uri) = namespace_uri(prefix) {
            return format!("{}{}", uri, local);
        }
    }
    name.to_string()
}

/// The fragment or last path segment of an IRI.
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['#', '/', ':']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Canonical qualified name, e.g. `owl:Class`.
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Concatenated direct text content, trimmed.
    pub text: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute by canonical name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// True if this node's canonical name is `name`.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Direct children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first non-empty child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.text.as_str())
            .find(|t| !t.is_empty())
    }

    /// `rdf:resource` of the first child with the given name.
    pub fn child_resource(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|c| c.name == name)
            .find_map(|c| c.attr("rdf:resource"))
    }

    /// The resource this node points at: its `rdf:resource`, or the subject
    /// of a nested description such as
    /// `<rdfs:domain><owl:Class rdf:about="#Holder"/></rdfs:domain>`.
    pub fn reference(&self, base: &str) -> Option<String> {
        if let Some(resource) = self.attr("rdf:resource") {
            return Some(resource.to_string());
        }
        self.children.iter().find_map(|c| c.subject(base))
    }

    /// First resolvable [`Node::reference`] among children with the given name.
    pub fn child_reference(&self, name: &str, base: &str) -> Option<String> {
        self.children_named(name).find_map(|c| c.reference(base))
    }

    /// The resource this node describes: `rdf:about`, or `rdf:ID` resolved
    /// against `base`.
    pub fn subject(&self, base: &str) -> Option<String> {
        if let Some(about) = self.attr("rdf:about") {
            return Some(about.to_string());
        }
        self.attr("rdf:ID").map(|id| {
            let base = base.trim_end_matches('#');
            format!("{}#{}", base, id)
        })
    }

    /// This node and all nodes below it, in document order.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_uses_canonical_prefix() {
        assert_eq!(
            qualified_name(Some("http://www.w3.org/2002/07/owl#"), "Class"),
            "owl:Class"
        );
        assert_eq!(
            qualified_name(Some("https://example.org/onto#"), "Widget"),
            "https://example.org/onto#Widget"
        );
        assert_eq!(qualified_name(None, "plain"), "plain");
    }

    #[test]
    fn test_compact_and_expand() {
        let iri = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
        assert_eq!(compact_iri(iri), "rdfs:subClassOf");
        assert_eq!(expand_qname("rdfs:subClassOf"), iri);
        assert_eq!(expand_qname("ex:thing"), "ex:thing");
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("http://example.org/onto#Person"), "Person");
        assert_eq!(local_name("https://schema.org/Person"), "Person");
        assert_eq!(local_name("https://example.org/onto/"), "onto");
        assert_eq!(local_name("Person"), "Person");
    }

    #[test]
    fn test_subject_resolves_rdf_id() {
        let node = Node::new("owl:Class").with_attr("rdf:ID", "Widget");
        assert_eq!(
            node.subject("http://example.org/onto#").as_deref(),
            Some("http://example.org/onto#Widget")
        );
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = Node::new("a")
            .with_child(Node::new("b").with_child(Node::new("c")))
            .with_child(Node::new("d"));
        let names: Vec<&str> = tree.descendants().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_child_accessors() {
        let node = Node::new("owl:Class")
            .with_child(Node::new("rdfs:comment"))
            .with_child(Node::new("rdfs:comment").with_text("Second"))
            .with_child(Node::new("rdfs:subClassOf").with_attr("rdf:resource", "#Agent"));
        assert_eq!(node.child_text("rdfs:comment"), Some("Second"));
        assert_eq!(node.child_resource("rdfs:subClassOf"), Some("#Agent"));
        assert!(node.child("skos:definition").is_none());
    }

    #[test]
    fn test_child_reference_reads_nested_descriptions() {
        let base = "http://example.org/fin#";
        let node = Node::new("owl:ObjectProperty")
            .with_child(Node::new("rdfs:domain").with_child(
                Node::new("owl:Class").with_attr("rdf:about", "http://example.org/fin#Holder"),
            ))
            .with_child(
                Node::new("rdfs:range")
                    .with_child(Node::new("owl:Class").with_attr("rdf:ID", "Asset")),
            )
            .with_child(Node::new("rdfs:subClassOf").with_child(Node::new("owl:Restriction")))
            .with_child(Node::new("rdfs:subClassOf").with_attr("rdf:resource", "#Agent"));

        assert_eq!(
            node.child_reference("rdfs:domain", base).as_deref(),
            Some("http://example.org/fin#Holder")
        );
        assert_eq!(
            node.child_reference("rdfs:range", base).as_deref(),
            Some("http://example.org/fin#Asset")
        );
        // An anonymous restriction is skipped in favour of the next edge
        assert_eq!(
            node.child_reference("rdfs:subClassOf", base).as_deref(),
            Some("#Agent")
        );
        assert!(node.child_reference("rdfs:seeAlso", base).is_none());
    }
}
