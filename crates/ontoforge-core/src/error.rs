//! Error taxonomy for the extraction pipeline.
//!
//! Only configuration errors abort a run. Fetch and parse errors fail the
//! current document; the import resolver swallows them per import. Scoring
//! errors never leave the importance analyzer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntologyError {
    /// Every problem found in a config document, reported together.
    #[error("invalid ontology config: {}", .0.join("; "))]
    ConfigValidation(Vec<String>),

    #[error("failed to fetch {url}{}: {reason}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("scoring service error: {0}")]
    ScoringService(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl OntologyError {
    pub fn fetch(url: impl Into<String>, status: Option<u16>, reason: impl Into<String>) -> Self {
        OntologyError::Fetch {
            url: url.into(),
            status,
            reason: reason.into(),
        }
    }

    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        OntologyError::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub type OntologyResult<T> = std::result::Result<T, OntologyError>;
