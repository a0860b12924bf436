//! Recording orchestration for one record-and-download session.
//!
//! Composes the management client and the download session: probe the
//! sensor, verify it supports logging over the network, start the download,
//! run the transfer loop with cancellation armed, report the outcome.

mod cancel;
mod recorder;

pub use cancel::CancellationController;
pub use recorder::{Recorder, RecordingSummary};

use sensorlog_client::ApiError;
use sensorlog_download::DownloadError;

/// Errors that end a recording run.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The sensor did not answer the identity probe. Nothing was started.
    #[error("failed detecting sensor: {0}")]
    Probe(#[source] ApiError),

    /// The status endpoint is unavailable, so the sensor does not support
    /// logging over the network.
    #[error("sensor does not appear to support logging over network: {0}")]
    Capability(#[source] ApiError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The transfer was cut short by a forced local abort after the remote
    /// stop could not be confirmed. The sensor may still be recording.
    #[error("logging aborted: sensor did not confirm the stop request")]
    Aborted,
}
