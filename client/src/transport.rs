//! Delivery of submissions to the collection endpoint.
//!
//! Two delivery modes share one seam. A normal delivery POSTs and waits
//! for the parsed response. A fire-and-forget delivery must outlive the
//! caller (the page may be tearing down, or the caller will not wait),
//! so it fires from a detached thread and reports nothing back.

use std::time::Duration;

use async_trait::async_trait;
use survey_protocol::HealthResponse;
use survey_protocol::Submission;
use survey_protocol::SubmitResponse;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FIRE_AND_FORGET_TIMEOUT: Duration = Duration::from_secs(5);

/// How a submission should be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Deliver even though the process may be tearing down. No response
    /// is collected.
    pub survives_unload: bool,
}

impl Delivery {
    pub fn normal() -> Delivery {
        Delivery {
            survives_unload: false,
        }
    }

    pub fn fire_and_forget() -> Delivery {
        Delivery {
            survives_unload: true,
        }
    }
}

/// Errors surfaced by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse server response: {0}")]
    Parse(String),
}

/// The seam between submission policy and the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one submission. Normal deliveries resolve to the parsed
    /// server response; unload-surviving deliveries return `Ok(None)`
    /// as soon as the send is handed off.
    async fn deliver(
        &self,
        submission: &Submission,
        delivery: Delivery,
    ) -> Result<Option<SubmitResponse>, TransportError>;
}

/// POSTs form-encoded submissions over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probe the endpoint with a GET and parse the status payload.
    pub async fn health(&self) -> Result<HealthResponse, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Parse(e.to_string()))
    }

    /// Hand the submission to a detached thread and return. The thread
    /// uses a blocking client with its own short timeout so it cannot
    /// hang around long after the main process is gone.
    fn send_detached(&self, submission: &Submission) {
        let endpoint = self.endpoint.clone();
        let pairs = submission.to_form_pairs();
        std::thread::spawn(move || {
            let client = match reqwest::blocking::Client::builder()
                .timeout(FIRE_AND_FORGET_TIMEOUT)
                .build()
            {
                Ok(client) => client,
                Err(err) => {
                    tracing::debug!("fire-and-forget client setup failed: {err}");
                    return;
                }
            };
            match client.post(&endpoint).form(&pairs).send() {
                Ok(response) => {
                    tracing::debug!("fire-and-forget delivery answered HTTP {}", response.status());
                }
                Err(err) => {
                    tracing::debug!("fire-and-forget delivery failed: {err}");
                }
            }
        });
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(
        &self,
        submission: &Submission,
        delivery: Delivery,
    ) -> Result<Option<SubmitResponse>, TransportError> {
        if delivery.survives_unload {
            self.send_detached(submission);
            return Ok(None);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .form(&submission.to_form_pairs())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = serde_json::from_str::<SubmitResponse>(&body)
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        Ok(Some(parsed))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A transport fake for exercising submission policy without a server.

    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use super::*;
    use survey_protocol::SubmitAction;

    pub(crate) struct RecordingTransport {
        deliveries: Mutex<Vec<(Submission, Delivery)>>,
        fail_next: AtomicBool,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                deliveries: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
            })
        }

        pub(crate) fn fail_next(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        pub(crate) fn deliveries(&self) -> Vec<(Submission, Delivery)> {
            self.deliveries.lock().unwrap().clone()
        }

        pub(crate) fn delivery_count(&self) -> usize {
            self.deliveries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn deliver(
            &self,
            submission: &Submission,
            delivery: Delivery,
        ) -> Result<Option<SubmitResponse>, TransportError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(TransportError::Network("connection refused".to_string()));
            }
            self.deliveries
                .lock()
                .unwrap()
                .push((submission.clone(), delivery));
            if delivery.survives_unload {
                Ok(None)
            } else {
                Ok(Some(SubmitResponse::Success {
                    action: SubmitAction::Updated,
                    row: 2,
                }))
            }
        }
    }
}
