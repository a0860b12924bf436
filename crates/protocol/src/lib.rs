//! Wire types for the sensor's recording API.
//!
//! The sensor exposes two HTTP surfaces: a JSON management API under
//! `/api/v2` and a separate log download service on its own port. This crate
//! holds the URL derivation for both plus the parsed forms of every JSON
//! body that crosses the wire, so the higher layers never probe responses
//! for key presence.

pub mod endpoint;
pub mod profile;
pub mod responses;

// Re-export primary types.
pub use endpoint::SensorEndpoint;
pub use profile::{DEFAULT_CHUNK_SIZE, RecordingProfile};
pub use responses::{LogStatus, ResponseError, SensorInfo, StartRequest, parse_ack};
