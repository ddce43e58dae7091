//! Remote scoring service client.
//!
//! The service receives `{prompt, context, max_count, items}` and answers
//! `{analysis: [{name, importanceScore, reasoning?, businessRelevance?,
//! domainSignificance?}]}`. Anything else is a `ScoringService` error, which
//! the analyzer turns into a heuristic fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{OntologyError, OntologyResult};

/// One item sent for scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringItem {
    pub name: String,
    pub description: String,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRequest {
    pub prompt: String,
    pub context: Option<String>,
    pub max_count: usize,
    pub items: Vec<ScoringItem>,
}

/// One scored item as returned by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceScore {
    pub name: String,
    pub importance_score: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Some services answer with a label, others with a number.
    #[serde(default)]
    pub business_relevance: Option<Value>,
    #[serde(default)]
    pub domain_significance: Option<String>,
}

impl ServiceScore {
    pub fn business_relevance_label(&self) -> Option<String> {
        match &self.business_relevance {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoringResponse {
    #[serde(default)]
    analysis: Vec<ServiceScore>,
}

/// An external importance scorer.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Service identifier for logs.
    fn name(&self) -> &str;

    async fn score(&self, request: &ScoringRequest) -> OntologyResult<Vec<ServiceScore>>;
}

/// JSON-over-HTTP scoring service.
pub struct HttpScoringService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScoringService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> OntologyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OntologyError::ScoringService(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScoringService for HttpScoringService {
    fn name(&self) -> &str {
        "http"
    }

    async fn score(&self, request: &ScoringRequest) -> OntologyResult<Vec<ServiceScore>> {
        debug!(
            "Scoring {} items via {} (max {})",
            request.items.len(),
            self.endpoint,
            request.max_count
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| OntologyError::ScoringService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OntologyError::ScoringService(format!(
                "{} returned HTTP {}",
                self.endpoint, status
            )));
        }

        let body: ScoringResponse = response
            .json()
            .await
            .map_err(|e| OntologyError::ScoringService(format!("invalid response: {}", e)))?;

        if body.analysis.is_empty() && !request.items.is_empty() {
            return Err(OntologyError::ScoringService(
                "response contained no analysis".to_string(),
            ));
        }

        Ok(body.analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ScoringRequest {
        ScoringRequest {
            prompt: "Rank entities".to_string(),
            context: Some("banking".to_string()),
            max_count: 2,
            items: vec![ScoringItem {
                name: "Account".to_string(),
                description: "A ledger account".to_string(),
                properties: vec!["number".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_parses_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .and(body_partial_json(json!({ "max_count": 2, "context": "banking" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "analysis": [
                    { "name": "Account", "importanceScore": 0.9, "businessRelevance": "high" },
                    { "name": "Ledger", "importanceScore": 0.4, "businessRelevance": 3 }
                ]
            })))
            .mount(&server)
            .await;

        let service =
            HttpScoringService::new(format!("{}/score", server.uri()), Duration::from_secs(5))
                .unwrap();
        let scores = service.score(&request()).await.unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].name, "Account");
        assert!((scores[0].importance_score - 0.9).abs() < 1e-9);
        assert_eq!(scores[0].business_relevance_label().as_deref(), Some("high"));
        assert_eq!(scores[1].business_relevance_label().as_deref(), Some("3"));
        assert_eq!(scores[1].reasoning, None);
    }

    #[tokio::test]
    async fn test_server_error_is_scoring_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = HttpScoringService::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = service.score(&request()).await.unwrap_err();
        assert!(matches!(err, OntologyError::ScoringService(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_scoring_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let service = HttpScoringService::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert!(service.score(&request()).await.is_err());
    }
}
