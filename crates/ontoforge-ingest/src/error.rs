use thiserror::Error;

/// A document could not be turned into a node tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Turtle parse error: {0}")]
    Turtle(String),
}
