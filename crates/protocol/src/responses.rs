//! Parsed forms of the sensor's JSON API bodies.
//!
//! Every management API response carries an `_ok` success marker. Parsing
//! checks the marker and all required fields up front and returns a typed
//! error, so callers never have to probe for key presence.

use serde::{Deserialize, Serialize};

use crate::profile::RecordingProfile;

/// Errors turning an API response body into a typed value.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The `_ok` marker was absent or false.
    #[error("sensor reported failure")]
    NotOk,

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

// ---------------------------------------------------------------------------
// /sys/info
// ---------------------------------------------------------------------------

/// Identity and version snapshot from `/sys/info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    pub uid: String,
    pub hardware: String,
    pub hw_ver: String,
    /// Normalized software version (`sw_ver`, or the legacy `release_tag`).
    pub sw_ver: String,
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_ok", default)]
    ok: bool,
    uid: Option<String>,
    hardware: Option<String>,
    hw_ver: Option<String>,
    sw_ver: Option<String>,
    release_tag: Option<String>,
}

impl SensorInfo {
    /// Parses a `/sys/info` response body.
    ///
    /// Firmware older than 2.90.0 reports the software version as
    /// `release_tag`; it is accepted whenever `sw_ver` is absent. When both
    /// are present, `sw_ver` wins.
    pub fn from_json(body: &str) -> Result<Self, ResponseError> {
        let raw: RawInfo = serde_json::from_str(body)?;
        if !raw.ok {
            return Err(ResponseError::NotOk);
        }
        let sw_ver = raw
            .sw_ver
            .or(raw.release_tag)
            .ok_or(ResponseError::MissingField("sw_ver"))?;
        Ok(Self {
            uid: raw.uid.ok_or(ResponseError::MissingField("uid"))?,
            hardware: raw.hardware.ok_or(ResponseError::MissingField("hardware"))?,
            hw_ver: raw.hw_ver.ok_or(ResponseError::MissingField("hw_ver"))?,
            sw_ver,
        })
    }
}

// ---------------------------------------------------------------------------
// /record/status
// ---------------------------------------------------------------------------

/// Recording state snapshot from `/record/status`.
///
/// Each poll yields a fresh independent snapshot; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStatus {
    pub state: String,
    pub queue_skip: i64,
    pub log_errors: i64,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(rename = "_ok", default)]
    ok: bool,
    state: Option<String>,
    queue_skip: Option<i64>,
    log_errors: Option<i64>,
}

impl LogStatus {
    /// Parses a `/record/status` response body.
    pub fn from_json(body: &str) -> Result<Self, ResponseError> {
        let raw: RawStatus = serde_json::from_str(body)?;
        if !raw.ok {
            return Err(ResponseError::NotOk);
        }
        Ok(Self {
            state: raw.state.ok_or(ResponseError::MissingField("state"))?,
            queue_skip: raw
                .queue_skip
                .ok_or(ResponseError::MissingField("queue_skip"))?,
            log_errors: raw
                .log_errors
                .ok_or(ResponseError::MissingField("log_errors"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Acknowledgements
// ---------------------------------------------------------------------------

/// Parses a bare `_ok`-marked acknowledgement (e.g. from `/record/stop`),
/// returning the full response map.
pub fn parse_ack(
    body: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, ResponseError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let serde_json::Value::Object(map) = value else {
        return Err(ResponseError::NotOk);
    };
    if !map.get("_ok").and_then(|v| v.as_bool()).unwrap_or(false) {
        return Err(ResponseError::NotOk);
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Download service
// ---------------------------------------------------------------------------

/// Body of the download-service start request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub target: String,
    pub profile: RecordingProfile,
}

impl StartRequest {
    /// Start request for a log download with the given profile.
    pub fn download(profile: &RecordingProfile) -> Self {
        Self {
            target: "download".into(),
            profile: profile.clone(),
        }
    }
}
