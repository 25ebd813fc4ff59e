use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, ensure_not_blank,
};
use crate::domain::value_objects::{EmbeddingVector, ModelTag};

#[derive(Serialize)]
pub struct EmbeddingsRequest {
    pub text: TextInput,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub shape: Vec<usize>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl EmbeddingsClientConfig {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            api_key: None,
            max_retries: 3,
            timeout_secs: 30,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingsError {
    #[error("Request failed: {0}")]
    RequestError(String),
    #[error("Service returned {status}: {body}")]
    StatusError { status: StatusCode, body: String },
    #[error("Invalid response: {0}")]
    ParseError(String),
}

impl EmbeddingsError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingsError::RequestError(_) => true,
            EmbeddingsError::StatusError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            EmbeddingsError::ParseError(_) => false,
        }
    }
}

impl From<EmbeddingsError> for EmbeddingProviderError {
    fn from(error: EmbeddingsError) -> Self {
        match error {
            EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            EmbeddingsError::StatusError { status, body } if status.is_server_error() => {
                EmbeddingProviderError::ServiceUnavailable(format!("{}: {}", status, body))
            }
            e @ EmbeddingsError::StatusError { .. } => EmbeddingProviderError::ApiError(e.to_string()),
            EmbeddingsError::ParseError(msg) => EmbeddingProviderError::ApiError(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn get_embedding(&self, text: &str) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            text: TextInput::Single(text.to_string()),
        };

        self.send_request(request).await
    }

    pub async fn get_embeddings(
        &self,
        texts: &[String],
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            text: TextInput::Multiple(texts.to_vec()),
        };

        self.send_request(request).await
    }

    async fn send_request(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempts <= self.config.max_retries => {
                    let backoff_time = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 1000.0) as u64,
                    );
                    warn!(
                        "Embedding request failed (attempt {}), retrying in {:?}: {}",
                        attempts, backoff_time, e
                    );
                    tokio::time::sleep(backoff_time).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let mut builder = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingsError::StatusError { status, body });
        }

        let response_data = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))?;

        if !response_data.success {
            return Err(EmbeddingsError::ParseError(
                "Service reported an unsuccessful embedding".to_string(),
            ));
        }

        Ok(response_data)
    }
}

/// `EmbeddingProvider` backed by the remote inference service.
pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
    model: ModelTag,
    dimension: usize,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient, model: ModelTag, dimension: usize) -> Self {
        Self {
            client,
            model,
            dimension,
        }
    }

    fn to_vector(&self, values: Vec<f32>) -> Result<EmbeddingVector, EmbeddingProviderError> {
        if values.len() != self.dimension {
            return Err(EmbeddingProviderError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            });
        }
        Ok(EmbeddingVector::new(self.model.clone(), values))
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingProviderError> {
        ensure_not_blank(text)?;

        let response = self.client.get_embedding(text).await?;
        let values = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingProviderError::ApiError("No embeddings returned".to_string()))?;

        self.to_vector(values)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<EmbeddingVector>, EmbeddingProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_not_blank(text)?;
        }

        let response = self.client.get_embeddings(texts).await?;
        debug!("Embedding service returned shape {:?}", response.shape);
        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        response
            .embeddings
            .into_iter()
            .map(|values| self.to_vector(values))
            .collect()
    }

    fn model(&self) -> &ModelTag {
        &self.model
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(url: String) -> InferenceEmbeddingProvider {
        let mut config = EmbeddingsClientConfig::new(url);
        config.max_retries = 0;
        config.timeout_secs = 2;
        let client = InferenceClient::new(config).unwrap();
        InferenceEmbeddingProvider::new(client, ModelTag::new("all-mpnet-base-v2", "1"), 3)
    }

    #[test]
    fn test_request_construction() {
        let single_request = EmbeddingsRequest {
            text: TextInput::Single("Hello world".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&single_request).unwrap(),
            r#"{"text":"Hello world"}"#
        );

        let multiple_request = EmbeddingsRequest {
            text: TextInput::Multiple(vec!["Hello".to_string(), "World".to_string()]),
        };
        assert_eq!(
            serde_json::to_string(&multiple_request).unwrap(),
            r#"{"text":["Hello","World"]}"#
        );
    }

    #[test]
    fn test_minimal_response_parses() {
        let response: EmbeddingsResponse =
            serde_json::from_str(r#"{"embeddings": [[0.1, 0.2, 0.3]]}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.embeddings[0].len(), 3);
    }

    #[test]
    fn test_error_classification() {
        assert!(EmbeddingsError::RequestError("reset".into()).is_retryable());
        assert!(
            EmbeddingsError::StatusError {
                status: StatusCode::BAD_GATEWAY,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !EmbeddingsError::StatusError {
                status: StatusCode::UNAUTHORIZED,
                body: String::new()
            }
            .is_retryable()
        );

        let mapped: EmbeddingProviderError = EmbeddingsError::RequestError("reset".into()).into();
        assert!(mapped.is_transient());
    }

    #[test]
    fn test_dimension_is_validated() {
        let p = provider("http://127.0.0.1:9".to_string());
        assert!(p.to_vector(vec![0.0; 3]).is_ok());
        assert!(matches!(
            p.to_vector(vec![0.0; 4]),
            Err(EmbeddingProviderError::DimensionMismatch { expected: 3, actual: 4 })
        ));
    }

    #[tokio::test]
    async fn test_blank_text_rejected_without_request() {
        let p = provider("http://127.0.0.1:9".to_string());
        assert!(matches!(p.embed("   ").await, Err(EmbeddingProviderError::EmptyInput)));
        assert!(matches!(
            p.embed_batch(&["ok".to_string(), "".to_string()]).await,
            Err(EmbeddingProviderError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let p = provider(format!("http://{}/embed", addr));
        let err = p.embed("hello").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {}", err);
    }
}
