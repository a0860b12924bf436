use std::fmt;

use serde::{Deserialize, Serialize};

/// One mebibyte.
const MIB: usize = 1024 * 1024;

/// Read-chunk size used when a profile's data rate is unknown: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = MIB;

/// Seconds of log data one read chunk should roughly cover.
const CHUNK_SECONDS: f64 = 2.0;

/// Expected log data rate in MiB/s for the stock recording profiles.
const EXPECTED_RATE_MIB_S: [(&str, f64); 4] = [
    ("minimal", 0.4),
    ("medium", 0.8),
    ("maximal", 4.2),
    ("calib", 14.0),
];

/// Named recording profile selecting the sensor-side log composition.
///
/// The name is opaque to the sensor API. Locally it doubles as the key into
/// the expected-rate table that sizes the download read chunks; unknown
/// names are passed through unchanged and get the default chunk size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingProfile(String);

impl RecordingProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expected data rate in MiB/s, if this is a known profile.
    pub fn expected_rate(&self) -> Option<f64> {
        EXPECTED_RATE_MIB_S
            .iter()
            .find(|(name, _)| *name == self.0)
            .map(|(_, rate)| *rate)
    }

    /// Read-chunk size in bytes: roughly [`CHUNK_SECONDS`] of data at the
    /// profile's expected rate, or [`DEFAULT_CHUNK_SIZE`] for unknown
    /// profiles.
    pub fn chunk_size(&self) -> usize {
        match self.expected_rate() {
            Some(rate) => (rate * MIB as f64 * CHUNK_SECONDS) as usize,
            None => DEFAULT_CHUNK_SIZE,
        }
    }
}

impl fmt::Display for RecordingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordingProfile {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RecordingProfile {
    fn from(name: String) -> Self {
        Self(name)
    }
}
