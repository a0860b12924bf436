//! Log download handshake and chunked transfer loop.
//!
//! Opens the streaming download on the sensor's download service, classifies
//! the response (log stream vs. rejection), and pulls the stream to disk in
//! profile-sized chunks with one progress line per chunk.

mod progress;
mod session;

pub use progress::{progress_line, rate, split_duration, transfer_line};
pub use session::{DownloadSession, LogStream, TransferSummary};

/// Errors from the download handshake or the transfer loop.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The sensor answered the start request with a JSON error body.
    #[error("sensor rejected the recording: {detail}")]
    Rejected { detail: String },

    /// The start response was neither a log stream nor a JSON rejection.
    #[error(
        "unexpected start response (content-type {}, disposition {})",
        .content_type.as_deref().unwrap_or("<none>"),
        .disposition.as_deref().unwrap_or("<none>")
    )]
    UnexpectedResponse {
        content_type: Option<String>,
        disposition: Option<String>,
    },

    /// The attachment carried no usable filename.
    #[error("no filename in content-disposition header")]
    MissingFilename,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
