//! Progress accounting for the transfer loop.
//!
//! Pure computation, no I/O: rate and duration math plus the one-line
//! human-readable status emitted per chunk.

use sensorlog_protocol::LogStatus;

const MIB: f64 = 1024.0 * 1024.0;

/// Instantaneous transfer rate in bytes/second.
///
/// Returns `0.0` when `elapsed_secs` is not positive; the clock can be too
/// coarse to separate two consecutive chunks.
pub fn rate(bytes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / elapsed_secs
}

/// Rounds elapsed seconds to the nearest whole second and splits into
/// minutes and seconds.
pub fn split_duration(elapsed_secs: f64) -> (u64, u64) {
    let total = (elapsed_secs + 0.5) as u64;
    (total / 60, total % 60)
}

/// The per-chunk transfer summary: `<file>: duration <m>:<ss>, size
/// <MiB>, rate <MiB/s>`.
pub fn transfer_line(filename: &str, elapsed_secs: f64, total_bytes: u64, rate_bps: f64) -> String {
    let (mins, secs) = split_duration(elapsed_secs);
    format!(
        "{filename}: duration {mins}:{secs:02}, size {:.1} MiB, rate {:.1} MiB/s",
        total_bytes as f64 / MIB,
        rate_bps / MIB,
    )
}

/// Prefixes the transfer summary with the sensor's recording state, or the
/// unknown-status placeholder when the last poll failed.
pub fn progress_line(status: Option<&LogStatus>, transfer: &str) -> String {
    match status {
        Some(s) => format!(
            "{} {} (skip {}, errors {})",
            s.state, transfer, s.queue_skip, s.log_errors
        ),
        None => format!("??? {transfer}"),
    }
}
