use std::fmt;

/// TCP port of the log download service on the sensor.
const DOWNLOAD_PORT: u16 = 21100;

/// Immutable addressing for one sensor.
///
/// Both base URLs are derived from the hostname once at construction. The
/// management API lives under `/api/v2` on the default HTTP port; the log
/// download service listens on its own port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEndpoint {
    host: String,
    api_base: String,
    download_base: String,
}

impl SensorEndpoint {
    /// Creates the endpoint for a sensor hostname or IP address.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let api_base = format!("http://{host}/api/v2");
        let download_base = format!("http://{host}:{DOWNLOAD_PORT}");
        Self {
            host,
            api_base,
            download_base,
        }
    }

    /// Creates an endpoint with explicit base URLs, for sensors reached
    /// through port forwarding or a proxy.
    pub fn with_bases(
        host: impl Into<String>,
        api_base: impl Into<String>,
        download_base: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            api_base: api_base.into(),
            download_base: download_base.into(),
        }
    }

    /// The sensor hostname or IP address as given.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// System information endpoint (liveness and identity probe), `GET`.
    pub fn info_url(&self) -> String {
        format!("{}/sys/info", self.api_base)
    }

    /// Recording status snapshot endpoint, `GET`.
    pub fn status_url(&self) -> String {
        format!("{}/record/status", self.api_base)
    }

    /// Stop-recording endpoint, `POST`.
    pub fn stop_url(&self) -> String {
        format!("{}/record/stop", self.api_base)
    }

    /// Download-service start endpoint, `POST`.
    pub fn start_url(&self) -> String {
        format!("{}/start", self.download_base)
    }
}

impl fmt::Display for SensorEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}
