//! Top-level orchestration of one recording session.

use std::path::PathBuf;

use sensorlog_client::SensorClient;
use sensorlog_download::{DownloadSession, TransferSummary};
use sensorlog_protocol::{RecordingProfile, SensorEndpoint, SensorInfo};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{CancellationController, RecordError};

/// Records one log from a sensor over the network.
pub struct Recorder {
    client: SensorClient,
    profile: RecordingProfile,
    output_dir: PathBuf,
}

impl Recorder {
    /// Creates a recorder for one sensor and recording profile.
    pub fn new(endpoint: SensorEndpoint, profile: RecordingProfile) -> Self {
        Self {
            client: SensorClient::new(endpoint),
            profile,
            output_dir: PathBuf::from("."),
        }
    }

    /// Directory the log file is written into. Defaults to the current
    /// working directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Runs one full session: probe, capability check, start the download,
    /// pull the stream with cancellation armed, report the outcome.
    ///
    /// Cancelling `cancel` requests a graceful stop: the sensor is asked to
    /// stop recording and the transfer drains until the stream closes. Only
    /// when that stop request fails is the transfer cut short locally, and
    /// the session then ends as failed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RecordingSummary, RecordError> {
        let sensor = self.client.probe().await.map_err(RecordError::Probe)?;
        info!(
            "Detected {} ({}, {} {})",
            sensor.uid, sensor.sw_ver, sensor.hardware, sensor.hw_ver
        );

        // A status snapshot must be readable before anything is started;
        // older firmware has no recording API at all.
        self.client
            .status()
            .await
            .map_err(RecordError::Capability)?;

        let session = DownloadSession::new(self.client.clone(), self.profile.clone());
        let stream = session.start().await?;
        info!(
            "Downloading {}, press CTRL-c to stop logging",
            stream.filename()
        );

        let controller = CancellationController::arm(self.client.clone(), cancel);
        let abort = controller.abort_flag();
        let outcome = stream.download(&self.output_dir, &self.client, &abort).await;
        let forced = controller.disarm().await;

        let transfer = outcome?;
        if forced {
            return Err(RecordError::Aborted);
        }

        Ok(RecordingSummary { sensor, transfer })
    }
}

/// Outcome of a successful recording session.
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    pub sensor: SensorInfo,
    pub transfer: TransferSummary,
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::header;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use sensorlog_download::DownloadError;
    use tokio::net::TcpListener;
    use tokio::sync::Notify;

    use super::*;

    const INFO_BODY: &str =
        r#"{"_ok":true,"uid":"ab12cd34","hardware":"sensor-x5","hw_ver":"1.2","sw_ver":"2.95.0"}"#;
    const STATUS_BODY: &str = r#"{"_ok":true,"state":"logging","queue_skip":0,"log_errors":0}"#;

    async fn start_server(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn recorder_at(addr: SocketAddr, profile: &str, dir: &std::path::Path) -> Recorder {
        let endpoint = SensorEndpoint::with_bases(
            addr.ip().to_string(),
            format!("http://{addr}/api/v2"),
            format!("http://{addr}"),
        );
        Recorder::new(endpoint, RecordingProfile::from(profile)).with_output_dir(dir)
    }

    /// Fake sensor whose log stream trickles chunks until the stop endpoint
    /// closes it (or forever, when the stop acknowledgement is negative).
    struct FakeSensor {
        stops: AtomicUsize,
        stop_ack: &'static str,
        close_on_stop: bool,
        streaming: Notify,
        stopped: Notify,
    }

    impl FakeSensor {
        fn new(stop_ack: &'static str, close_on_stop: bool) -> Arc<Self> {
            Arc::new(Self {
                stops: AtomicUsize::new(0),
                stop_ack,
                close_on_stop,
                streaming: Notify::new(),
                stopped: Notify::new(),
            })
        }
    }

    fn log_stream(sensor: &Arc<FakeSensor>) -> Response {
        let state = Arc::clone(sensor);
        let body = futures_util::stream::unfold((state, true), |(state, first)| async move {
            tokio::select! {
                biased;
                _ = state.stopped.notified() => None,
                _ = tokio::time::sleep(Duration::from_millis(2)) => {
                    if first {
                        state.streaming.notify_one();
                    }
                    let chunk: Result<Vec<u8>, std::io::Error> = Ok(vec![0u8; 256 * 1024]);
                    Some((chunk, (state, false)))
                }
            }
        });
        (
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"snap.bin\"",
                ),
            ],
            Body::from_stream(body),
        )
            .into_response()
    }

    fn sensor_router(sensor: &Arc<FakeSensor>) -> Router {
        let stream_state = Arc::clone(sensor);
        let stop_state = Arc::clone(sensor);
        Router::new()
            .route("/api/v2/sys/info", get(|| async { INFO_BODY }))
            .route("/api/v2/record/status", get(|| async { STATUS_BODY }))
            .route(
                "/api/v2/record/stop",
                post(move || {
                    stop_state.stops.fetch_add(1, Ordering::SeqCst);
                    if stop_state.close_on_stop {
                        stop_state.stopped.notify_one();
                    }
                    let ack = stop_state.stop_ack;
                    async move { ack }
                }),
            )
            .route("/start", post(move || async move { log_stream(&stream_state) }))
    }

    #[tokio::test]
    async fn records_to_completion_when_sensor_closes_stream() {
        let body = vec![9u8; 50_000];
        let served = body.clone();
        let app = Router::new()
            .route("/api/v2/sys/info", get(|| async { INFO_BODY }))
            .route("/api/v2/record/status", get(|| async { STATUS_BODY }))
            .route(
                "/start",
                post(move || {
                    let served = served.clone();
                    async move {
                        (
                            [
                                (header::CONTENT_TYPE, "application/octet-stream"),
                                (
                                    header::CONTENT_DISPOSITION,
                                    "attachment; filename=\"snap.bin\"",
                                ),
                            ],
                            served,
                        )
                    }
                }),
            );

        let addr = start_server(app).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "medium", dir.path());

        let summary = recorder.run(CancellationToken::new()).await.unwrap();
        assert_eq!(summary.sensor.uid, "ab12cd34");
        assert_eq!(summary.transfer.filename, "snap.bin");
        assert_eq!(summary.transfer.total_bytes, 50_000);

        let written = std::fs::read(dir.path().join("snap.bin")).unwrap();
        assert_eq!(written, body);
    }

    #[tokio::test]
    async fn fails_when_sensor_not_detected() {
        let app = Router::new();
        let addr = start_server(app).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "medium", dir.path());

        let err = recorder.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RecordError::Probe(_)));
    }

    #[tokio::test]
    async fn fails_when_logging_unsupported() {
        let app = Router::new().route("/api/v2/sys/info", get(|| async { INFO_BODY }));
        let addr = start_server(app).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "medium", dir.path());

        let err = recorder.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, RecordError::Capability(_)));
    }

    #[tokio::test]
    async fn fails_with_detail_when_start_rejected() {
        let app = Router::new()
            .route("/api/v2/sys/info", get(|| async { INFO_BODY }))
            .route("/api/v2/record/status", get(|| async { STATUS_BODY }))
            .route(
                "/start",
                post(|| async {
                    (
                        [(header::CONTENT_TYPE, "application/json")],
                        r#"{"_ok":false,"error":"busy"}"#,
                    )
                }),
            );

        let addr = start_server(app).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "medium", dir.path());

        let err = recorder.run(CancellationToken::new()).await.unwrap_err();
        match err {
            RecordError::Download(DownloadError::Rejected { detail }) => {
                assert_eq!(detail, "busy");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        // No file was created.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn interrupt_with_acknowledged_stop_ends_in_success() {
        let sensor = FakeSensor::new(r#"{"_ok":true}"#, true);
        let addr = start_server(sensor_router(&sensor)).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "medium", dir.path());

        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { recorder.run(cancel).await }
        });

        // Interrupt once the stream is flowing.
        sensor.streaming.notified().await;
        cancel.cancel();

        let summary = run.await.unwrap().unwrap();
        assert!(summary.transfer.total_bytes >= 256 * 1024);
        assert_eq!(sensor.stops.load(Ordering::SeqCst), 1);

        let written = std::fs::read(dir.path().join("snap.bin")).unwrap();
        assert_eq!(written.len() as u64, summary.transfer.total_bytes);
    }

    #[tokio::test]
    async fn interrupt_with_failed_stop_aborts_and_fails() {
        // The sensor never acknowledges the stop and never closes the
        // stream; only the forced local abort ends the transfer.
        let sensor = FakeSensor::new(r#"{"_ok":false}"#, false);
        let addr = start_server(sensor_router(&sensor)).await;
        let dir = tempfile::tempdir().unwrap();
        let recorder = recorder_at(addr, "minimal", dir.path());

        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { recorder.run(cancel).await }
        });

        sensor.streaming.notified().await;
        cancel.cancel();

        let err = run.await.unwrap().unwrap_err();
        assert!(matches!(err, RecordError::Aborted));
        assert_eq!(sensor.stops.load(Ordering::SeqCst), 1);

        // The partial log stays on disk.
        let written = std::fs::read(dir.path().join("snap.bin")).unwrap();
        assert!(!written.is_empty());
    }
}
