//! HTTP client for a queue-backed serverless embedding endpoint
//!
//! Speaks the submit/status/cancel surface of serverless job providers:
//! `POST /run` enqueues a batch, `GET /status/{id}` reports it, and
//! `POST /cancel/{id}` aborts it. Requests carry bearer authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use embedflow_core::{Chunk, EmbedRequest, EmbedResponse};

use crate::{
    endpoint::{JobEndpoint, JobStatus},
    error::OrchestrationError,
    Result,
};

/// Default per-request timeout (30 seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Configuration for [`HttpJobEndpoint`].
#[derive(Debug, Clone, Deserialize)]
pub struct HttpEndpointConfig {
    /// Base URL of the endpoint, e.g. `https://api.example.com/v2/abc123`.
    pub endpoint_url: String,
    /// Bearer token authenticating against the endpoint.
    pub api_key: String,
    /// Per-request timeout in seconds. Default: 30.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    /// Present once the worker has finished; its shape is the worker's
    /// own batch response.
    #[serde(default)]
    output: Option<EmbedResponse>,
    #[serde(default)]
    error: Option<String>,
}

/// Remote job endpoint over HTTP.
pub struct HttpJobEndpoint {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpJobEndpoint {
    /// Build the endpoint client.
    ///
    /// # Errors
    /// Returns `Config` when the endpoint URL or API key is missing, the
    /// one precondition without which orchestration cannot start.
    pub fn new(config: HttpEndpointConfig) -> Result<Self> {
        if config.endpoint_url.is_empty() {
            return Err(OrchestrationError::Config(
                "endpoint URL is required".to_string(),
            ));
        }
        if config.api_key.is_empty() {
            return Err(OrchestrationError::Config(
                "endpoint API key is required".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                OrchestrationError::Config(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: config.endpoint_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Whether the endpoint answers its health probe.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl JobEndpoint for HttpJobEndpoint {
    async fn submit(&self, batch_id: &str, chunks: &[Chunk]) -> Result<String> {
        let url = format!("{}/run", self.base_url);
        let request = EmbedRequest {
            batch_id: batch_id.to_string(),
            chunks: chunks.to_vec(),
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "input": request }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OrchestrationError::Submission(format!(
                "endpoint returned {} for batch {}",
                response.status(),
                batch_id
            )));
        }
        let submit: SubmitResponse = response.json().await?;
        debug!(batch_id, job_id = %submit.id, "job submitted");
        Ok(submit.id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let url = format!("{}/status/{}", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OrchestrationError::Status(format!(
                "endpoint returned {} for job {}",
                response.status(),
                job_id
            )));
        }
        let status: StatusResponse = response.json().await?;
        Ok(match status.status.as_str() {
            "COMPLETED" => {
                JobStatus::Completed(status.output.map(|o| o.vectors).unwrap_or_default())
            }
            "FAILED" => {
                JobStatus::Failed(status.error.unwrap_or_else(|| "Unknown error".to_string()))
            }
            "CANCELLED" => JobStatus::Cancelled,
            "TIMED_OUT" => JobStatus::TimedOut,
            "IN_PROGRESS" => JobStatus::InProgress,
            // IN_QUEUE and anything unrecognized stay pending
            _ => JobStatus::Queued,
        })
    }

    async fn cancel(&self, job_id: &str) -> Result<()> {
        let url = format!("{}/cancel/{}", self.base_url, job_id);
        self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_endpoint_url() {
        let err = HttpJobEndpoint::new(HttpEndpointConfig {
            endpoint_url: String::new(),
            api_key: "key".to_string(),
            request_timeout_secs: 30,
        })
        .err()
        .unwrap();
        assert!(matches!(err, OrchestrationError::Config(_)));
    }

    #[test]
    fn rejects_missing_api_key() {
        let err = HttpJobEndpoint::new(HttpEndpointConfig {
            endpoint_url: "https://api.example.com/v2/abc".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
        })
        .err()
        .unwrap();
        assert!(matches!(err, OrchestrationError::Config(_)));
    }

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let endpoint = HttpJobEndpoint::new(HttpEndpointConfig {
            endpoint_url: "https://api.example.com/v2/abc/".to_string(),
            api_key: "key".to_string(),
            request_timeout_secs: 30,
        })
        .unwrap();
        assert_eq!(endpoint.base_url, "https://api.example.com/v2/abc");
    }
}
