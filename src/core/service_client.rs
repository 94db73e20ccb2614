// src/core/service_client.rs
//! HTTP client for the job matching (AI ranking) service

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::recommend::MatchingClient;
use crate::types::response::{JobMatchRequest, JobMatchResponse};
use crate::types::{MatchCandidate, MatchScore};

const MATCH_JOBS_ENDPOINT: &str = "/match-jobs";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ServiceClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl MatchingClient for ServiceClient {
    async fn rank(&self, profile: &str, candidates: &[MatchCandidate]) -> Result<Vec<MatchScore>> {
        let url = format!("{}{}", self.base_url, MATCH_JOBS_ENDPOINT);
        info!(
            "Calling job matching service with {} candidates: {}",
            candidates.len(),
            url
        );

        let mut request = self
            .client
            .post(&url)
            .json(&JobMatchRequest { profile, candidates });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to call job matching service")?;

        let status = response.status();
        debug!("Job matching response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Job matching service error {}: {}", status, error_text);
            anyhow::bail!("Job matching failed with status {}: {}", status, error_text)
        }

        let body: JobMatchResponse = response
            .json()
            .await
            .context("Failed to parse job match response")?;

        if let Some(status) = body.status.as_deref() {
            if status != "success" {
                anyhow::bail!("Job matching failed: {}", status)
            }
        }

        Ok(body.matches)
    }
}
