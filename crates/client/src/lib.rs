//! JSON/HTTP client for the sensor's management API.
//!
//! Wraps the three remote operations the recorder needs: the identity probe,
//! the recording-status snapshot, and the stop-recording request. Every call
//! is independent; no state is carried between calls beyond the endpoint
//! URLs, so the transfer loop can poll status without coordinating with the
//! probe or stop paths.

use sensorlog_protocol::{LogStatus, SensorEndpoint, SensorInfo, parse_ack};
use tracing::debug;

/// Errors from one management API call.
///
/// Carries the request URL so a failure names the endpoint it came from.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bad response from {url}: {source}")]
    Response {
        url: String,
        #[source]
        source: sensorlog_protocol::ResponseError,
    },
}

/// Client for the sensor's management API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SensorClient {
    http: reqwest::Client,
    endpoint: SensorEndpoint,
}

impl SensorClient {
    /// Creates a client for the given sensor.
    ///
    /// No request timeout is configured. The sensor streams for as long as
    /// the operator wants, so termination is driven by the remote closing
    /// the connection or by cancellation, never by a deadline.
    pub fn new(endpoint: SensorEndpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &SensorEndpoint {
        &self.endpoint
    }

    /// The underlying HTTP client, shared with the download service path.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetches the sensor's identity and software version.
    ///
    /// Succeeds only if the response carries the success marker and the
    /// full identity set. Legacy firmware reporting `release_tag` instead
    /// of `sw_ver` is normalized, not rejected.
    pub async fn probe(&self) -> Result<SensorInfo, ApiError> {
        let url = self.endpoint.info_url();
        let body = self.get(&url).await?;
        SensorInfo::from_json(&body).map_err(|source| ApiError::Response { url, source })
    }

    /// Fetches a fresh recording-status snapshot.
    pub async fn status(&self) -> Result<LogStatus, ApiError> {
        let url = self.endpoint.status_url();
        let body = self.get(&url).await?;
        LogStatus::from_json(&body).map_err(|source| ApiError::Response { url, source })
    }

    /// Asks the sensor to stop the active recording.
    ///
    /// Sends an empty POST. Success requires the acknowledgement marker;
    /// the full response map is returned for logging.
    pub async fn stop_recording(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        let url = self.endpoint.stop_url();
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| ApiError::Http {
                url: url.clone(),
                source,
            })?;
        let body = response.text().await.map_err(|source| ApiError::Http {
            url: url.clone(),
            source,
        })?;
        debug!(%url, %body, "sensor response");
        parse_ack(&body).map_err(|source| ApiError::Response { url, source })
    }

    async fn get(&self, url: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| ApiError::Http {
                url: url.to_owned(),
                source,
            })?;
        let body = response.text().await.map_err(|source| ApiError::Http {
            url: url.to_owned(),
            source,
        })?;
        debug!(%url, %body, "sensor response");
        Ok(body)
    }
}
