//! Ontoforge Ingest - raw document handling.
//!
//! Everything between "bytes from somewhere" and "a tree we can extract from":
//!
//! - **Cache**: filesystem-safe keys derived from URLs, family-namespaced
//! - **Family**: which standards body published a document
//! - **Document**: the uniform node tree with canonical qualified names
//! - **RDF**: HTML rejection, entity sanitization, format sniffing, and the
//!   RDF/XML and Turtle readers

pub mod cache;
pub mod document;
pub mod error;
pub mod family;
pub mod rdf;

pub use cache::{cache_key, sanitize_segment, DocumentCache};
pub use document::{compact_iri, expand_qname, local_name, Node, NAMESPACES};
pub use error::ParseError;
pub use family::OntologyFamily;
pub use rdf::{
    looks_like_html, parse_rdf, parse_turtle, parse_xml, sanitize_entities, sniff_format,
    RdfDocument, RdfFormat,
};
