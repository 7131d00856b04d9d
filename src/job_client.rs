// Remote transcription job client
//
// This module talks to the queue-based inference API: one POST to submit a
// transcription job, then GET polls of the status endpoint until the job
// reports COMPLETED. The poll loop is unbounded unless a cap is configured;
// any non-success HTTP response aborts the whole attempt.

use std::time::Duration;

use log::{debug, info};
use reqwest::header;
use serde_json::Value;

use crate::config::{defaults, ClientConfig};
use crate::error::RemoteError;
use crate::models::{JobHandle, StatusResponse, SubmitResponse, TranscriptionRequest};

/// Client for one remote transcription queue
pub struct TranscriptionJobClient {
    client: reqwest::Client,
    run_url: String,
    status_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: Option<u64>,
}

impl TranscriptionJobClient {
    /// Create a client with the default poll cadence and no request timeout
    pub fn new(run_url: String, status_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            run_url,
            status_url,
            api_key,
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            max_polls: None,
        }
    }

    /// Create a client from the ambient settings
    pub fn with_config(config: &ClientConfig, api_key: String) -> Self {
        let client = match config.request_timeout {
            Some(timeout) => reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            None => reqwest::Client::new(),
        };

        Self {
            client,
            run_url: config.run_url.clone(),
            status_url: config.status_url.clone(),
            api_key,
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        }
    }

    /// Override the delay between two status polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Cap the number of status polls; without a cap the loop never gives up
    pub fn with_max_polls(mut self, cap: u64) -> Self {
        self.max_polls = Some(cap);
        self
    }

    /// Submit a transcription job to the remote queue
    ///
    /// Fails with [`RemoteError::Status`] on any non-success HTTP response;
    /// in that case no polling takes place.
    pub async fn submit(&self, request: &TranscriptionRequest) -> Result<JobHandle, RemoteError> {
        debug!("Submitting transcription request to {}", self.run_url);

        let response = self
            .client
            .post(&self.run_url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            // The queue expects the raw key, not a Bearer scheme
            .header(header::AUTHORIZATION, self.api_key.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let submitted: SubmitResponse = serde_json::from_str(&body)?;
        info!("Job {} accepted by the remote queue", submitted.id);
        Ok(JobHandle::from(submitted.id))
    }

    /// Poll the status endpoint until the job completes
    ///
    /// Only COMPLETED terminates the loop successfully; FAILED and unknown
    /// status strings keep it polling. A non-success HTTP response on any
    /// poll aborts with the status code and body.
    pub async fn await_completion(&self, handle: &JobHandle) -> Result<Value, RemoteError> {
        let url = self.status_url_for(handle);
        let mut polls: u64 = 0;

        loop {
            let response = self
                .client
                .get(&url)
                .header(header::ACCEPT, "application/json")
                .header(header::AUTHORIZATION, self.api_key.as_str())
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(RemoteError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: StatusResponse = serde_json::from_str(&body)?;
            polls += 1;

            if parsed.status.is_completed() {
                info!("Job {} completed after {} poll(s)", handle, polls);
                return Ok(parsed.output.unwrap_or(Value::Null));
            }

            info!(
                "Job {} not finished (status: {}), polling again in {:?}",
                handle, parsed.status, self.poll_interval
            );

            if let Some(cap) = self.max_polls {
                if polls >= cap {
                    return Err(RemoteError::PollBudgetExhausted(polls));
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Submit a job and wait for its result
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Value, RemoteError> {
        let handle = self.submit(request).await?;
        self.await_completion(&handle).await
    }

    fn status_url_for(&self, handle: &JobHandle) -> String {
        format!("{}/{}", self.status_url.trim_end_matches('/'), handle)
    }
}
