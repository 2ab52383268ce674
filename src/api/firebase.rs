//! Firebase Realtime Database client
//!
//! Reads the catalog node over the REST API (`GET <db>/<path>.json`) and
//! follows live changes over the streaming API (`Accept: text/event-stream`).
//! REST docs: https://firebase.google.com/docs/reference/rest/database

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::events::{EventParser, TreeEvent};

/// Firebase API error types
#[derive(Error, Debug)]
pub enum FirebaseError {
    #[error("Permission denied ({0})")]
    PermissionDenied(u16),

    #[error("Rate limited (429), retries exhausted")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream cancelled by server: {0}")]
    Cancelled(String),

    #[error("Stream credentials were revoked")]
    AuthRevoked,

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Realtime database client
pub struct FirebaseClient {
    base_url: String,
    client: reqwest::Client,
    stream_client: reqwest::Client,
    max_retries: u32,
    max_retry_wait: Duration,
}

/// Upper bound on a single throttling back-off
const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

impl FirebaseClient {
    /// Create a client for a database URL (e.g. `https://mflix-default-rtdb.firebaseio.com`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            // No overall timeout: the event stream stays open indefinitely
            stream_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            max_retries: 3,
            max_retry_wait: MAX_RETRY_WAIT,
        }
    }

    /// Cap how long one throttled retry may wait
    pub fn with_max_retry_wait(mut self, wait: Duration) -> Self {
        self.max_retry_wait = wait;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// REST url of a node
    pub fn node_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}.json", self.base_url, encoded.join("/"))
    }

    /// Fetch a node. A missing node comes back as `Value::Null`.
    pub async fn fetch(&self, path: &str) -> Result<Value, FirebaseError> {
        let url = self.node_url(path);
        let mut retries = 0;

        loop {
            debug!(url = %url, "fetching catalog node");
            let response = self
                .client
                .get(&url)
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        FirebaseError::InvalidResponse(format!("JSON parse error: {}", e))
                    });
                }
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(FirebaseError::RateLimited);
                    }

                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    let wait = retry_delay(retry_after, retries, self.max_retry_wait);

                    warn!(
                        status = %response.status(),
                        wait_secs = wait.as_secs(),
                        retries,
                        "throttled, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                status => return Err(status_error(status)),
            }
        }
    }

    /// Stream changes of a node into `tx` until the server closes the
    /// stream or the receiver goes away. Keep-alives are swallowed;
    /// `cancel`/`auth_revoked` end the stream with an error.
    pub async fn subscribe(
        &self,
        path: &str,
        tx: UnboundedSender<TreeEvent>,
    ) -> Result<(), FirebaseError> {
        let url = self.node_url(path);
        info!(url = %url, "opening catalog stream");

        let response = self
            .stream_client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check_status(response)?;

        let mut parser = EventParser::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for frame in parser.feed(&chunk) {
                let Some(event) = TreeEvent::from_frame(&frame)? else {
                    continue;
                };
                match event {
                    TreeEvent::KeepAlive => continue,
                    TreeEvent::Cancel(reason) => return Err(FirebaseError::Cancelled(reason)),
                    TreeEvent::AuthRevoked => return Err(FirebaseError::AuthRevoked),
                    event => {
                        debug!(event = event_kind(&event), "catalog stream event");
                        if tx.send(event).is_err() {
                            debug!("stream receiver dropped, closing catalog stream");
                            return Ok(());
                        }
                    }
                }
            }
        }

        info!("catalog stream closed by server");
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, FirebaseError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response.status()))
    }
}

/// Honour Retry-After, otherwise back off exponentially; never past `cap`
fn retry_delay(retry_after: Option<u64>, retries: u32, cap: Duration) -> Duration {
    let secs = retry_after.unwrap_or_else(|| 2u64.saturating_pow(retries));
    Duration::from_secs(secs).min(cap)
}

fn status_error(status: StatusCode) -> FirebaseError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FirebaseError::PermissionDenied(status.as_u16())
        }
        StatusCode::TOO_MANY_REQUESTS => FirebaseError::RateLimited,
        status => FirebaseError::ServerError(status.as_u16()),
    }
}

fn event_kind(event: &TreeEvent) -> &'static str {
    match event {
        TreeEvent::Put { .. } => "put",
        TreeEvent::Patch { .. } => "patch",
        TreeEvent::KeepAlive => "keep-alive",
        TreeEvent::Cancel(_) => "cancel",
        TreeEvent::AuthRevoked => "auth_revoked",
    }
}
