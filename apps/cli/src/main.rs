//! Command-line recorder for networked sensors.
//!
//! Streams a log from the sensor to a file in the current directory and
//! stops gracefully on CTRL-C: the first interrupt asks the sensor to stop
//! logging, then the remaining buffered data is drained before exit.

use clap::Parser;
use sensorlog_protocol::{RecordingProfile, SensorEndpoint};
use sensorlog_recorder::Recorder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "\
Examples:

    Record a medium log:

        sensorlog 10.0.2.1 medium

    Record a medium log for approx. 20 seconds:

        timeout -s INT 20 sensorlog 172.22.1.44 medium
";

/// Record a log from a sensor over ethernet.
#[derive(Parser, Debug)]
#[command(version, about, after_help = EXAMPLES)]
struct Args {
    /// Sensor hostname or IP address
    #[arg(value_name = "sensor")]
    sensor: String,

    /// Recording profile, e.g. minimal, medium or maximal
    #[arg(value_name = "profile")]
    profile: String,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "parsed arguments");

    let recorder = Recorder::new(
        SensorEndpoint::new(args.sensor),
        RecordingProfile::new(args.profile),
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    match recorder.run(cancel).await {
        Ok(_) => info!("Done"),
        Err(err) => {
            error!("Ouch: {err}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
