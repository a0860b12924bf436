//! Start-download handshake and the chunked transfer loop.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures_util::TryStreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use sensorlog_client::SensorClient;
use sensorlog_protocol::{RecordingProfile, StartRequest};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::{DownloadError, progress};

/// One recording session against the sensor's download service.
///
/// Starting the download is what starts the recording: the sensor begins
/// logging when the start request is accepted and streams the log back in
/// the same response.
pub struct DownloadSession {
    client: SensorClient,
    profile: RecordingProfile,
}

impl DownloadSession {
    pub fn new(client: SensorClient, profile: RecordingProfile) -> Self {
        Self { client, profile }
    }

    /// Sends the start request and classifies the response.
    ///
    /// A JSON body means the sensor refused (already recording, unknown
    /// profile, ...); the server's message becomes the failure detail. An
    /// accepted request answers with the log stream itself: an octet-stream
    /// attachment whose filename names the output file. Anything else is an
    /// unexpected response. No file is touched here.
    pub async fn start(&self) -> Result<LogStream, DownloadError> {
        let url = self.client.endpoint().start_url();
        let request = StartRequest::download(&self.profile);
        let response = self.client.http().post(&url).json(&request).send().await?;

        let content_type = header_text(&response, CONTENT_TYPE);
        let disposition = header_text(&response, CONTENT_DISPOSITION);
        debug!(?content_type, ?disposition, "start response headers");

        if content_type.as_deref().map(strip_params).as_deref() == Some("application/json") {
            let body = response.text().await?;
            return Err(DownloadError::Rejected {
                detail: rejection_detail(&body),
            });
        }

        let is_stream =
            content_type.as_deref().map(strip_params).as_deref() == Some("application/octet-stream");
        let is_attachment =
            disposition.as_deref().map(strip_params).as_deref() == Some("attachment");
        if !is_stream || !is_attachment {
            return Err(DownloadError::UnexpectedResponse {
                content_type,
                disposition,
            });
        }

        // The disposition filename is the only source of the output name.
        let filename = disposition
            .as_deref()
            .and_then(attachment_filename)
            .ok_or(DownloadError::MissingFilename)?;

        Ok(LogStream {
            filename,
            chunk_size: self.profile.chunk_size(),
            response,
        })
    }
}

/// An open log stream, ready to be pulled to disk.
#[derive(Debug)]
pub struct LogStream {
    filename: String,
    chunk_size: usize,
    response: reqwest::Response,
}

impl LogStream {
    /// Destination filename announced by the sensor.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Read size for the transfer loop, sized from the profile.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Pulls the stream to `<dir>/<filename>` chunk by chunk, emitting one
    /// progress line per chunk.
    ///
    /// The loop checks `abort` before every read and stops without error
    /// once it is set; an empty read means the sensor closed the stream and
    /// also ends the loop normally. After each chunk the sensor's status is
    /// polled for the progress line; a failed poll shows an unknown state
    /// and the transfer continues. Read and write faults end the session as
    /// failed, keeping whatever was already written.
    pub async fn download(
        self,
        dir: &Path,
        client: &SensorClient,
        abort: &AtomicBool,
    ) -> Result<TransferSummary, DownloadError> {
        let LogStream {
            filename,
            chunk_size,
            response,
        } = self;

        let path = dir.join(&filename);
        let mut file = File::create(&path).await?;
        let mut reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let mut buf = vec![0u8; chunk_size];

        let started = Instant::now();
        let mut last_chunk = started;
        let mut total_bytes: u64 = 0;

        let result = async {
            while !abort.load(Ordering::SeqCst) {
                let n = read_full(&mut reader, &mut buf).await?;
                let now = Instant::now();

                // Empty read: the remote closed the stream.
                if n == 0 {
                    break;
                }

                file.write_all(&buf[..n]).await?;
                total_bytes += n as u64;

                let chunk_rate = progress::rate(n as u64, (now - last_chunk).as_secs_f64());
                last_chunk = now;
                let line = progress::transfer_line(
                    &filename,
                    (now - started).as_secs_f64(),
                    total_bytes,
                    chunk_rate,
                );

                let status = match client.status().await {
                    Ok(status) => Some(status),
                    Err(err) => {
                        debug!(%err, "status poll failed");
                        None
                    }
                };
                info!("{}", progress::progress_line(status.as_ref(), &line));
            }
            Ok::<(), DownloadError>(())
        }
        .await;

        // Keep whatever reached the file, even when the loop failed.
        let flushed = file.flush().await;
        result?;
        flushed?;

        Ok(TransferSummary {
            filename,
            total_bytes,
            elapsed: started.elapsed(),
        })
    }
}

/// What one transfer wrote to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub filename: String,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

/// Reads until `buf` is full or the stream ends. A short count is only
/// returned at end of stream.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn header_text(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Leading token of a header value, with `;`-separated parameters stripped.
fn strip_params(value: &str) -> String {
    let base = match value.split_once(';') {
        Some((base, _)) => base,
        None => value,
    };
    base.trim().to_ascii_lowercase()
}

/// Failure detail of a JSON rejection body: the server's `error` field when
/// present, otherwise the raw body.
fn rejection_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_owned())
}

/// Filename from a `Content-Disposition` value, matching `filename="<name>"`
/// greedily so embedded quotes survive.
fn attachment_filename(disposition: &str) -> Option<String> {
    let start = disposition.find("filename=\"")? + "filename=\"".len();
    let rest = &disposition[start..];
    let end = rest.rfind('"')?;
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_owned())
}
