fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use sensorlog_protocol::{
        LogStatus, RecordingProfile, ResponseError, SensorInfo, StartRequest, parse_ack,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture body captured from sensor firmware.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    // --- Captured firmware responses ---

    #[test]
    fn fixture_info_response() {
        let info = SensorInfo::from_json(&load_fixture("info_response.json")).unwrap();
        assert_eq!(info.uid, "DX5-0042-AB12");
        assert_eq!(info.hardware, "devkit");
        assert_eq!(info.hw_ver, "1.2");
        assert_eq!(info.sw_ver, "2.95.0_191");
    }

    #[test]
    fn fixture_info_response_legacy() {
        // Pre-2.90.0 firmware reports the software version as release_tag.
        let info = SensorInfo::from_json(&load_fixture("info_response_legacy.json")).unwrap();
        assert_eq!(info.uid, "DX5-0007-CC01");
        assert_eq!(info.sw_ver, "2.85.3");
    }

    #[test]
    fn fixture_status_response() {
        let status = LogStatus::from_json(&load_fixture("status_response.json")).unwrap();
        assert_eq!(status.state, "logging");
        assert_eq!(status.queue_skip, 0);
        assert_eq!(status.log_errors, 0);
    }

    #[test]
    fn fixture_stop_ack() {
        let ack = parse_ack(&load_fixture("stop_ack.json")).unwrap();
        assert_eq!(ack.get("stream").and_then(|v| v.as_i64()), Some(0));
    }

    // --- Request bodies the recorder sends ---

    #[test]
    fn start_request_matches_captured_format() {
        let fixture: serde_json::Value =
            serde_json::from_str(&load_fixture("start_request.json")).unwrap();
        let request = StartRequest::download(&RecordingProfile::from("medium"));
        assert_eq!(serde_json::to_value(&request).unwrap(), fixture);
    }

    // --- Error and legacy bodies seen in the field ---

    #[test]
    fn stop_nack_from_idle_sensor() {
        // A sensor with no active recording still answers, with _ok false.
        let body = r#"{"_ok": false, "error": "not logging"}"#;
        assert!(matches!(parse_ack(body), Err(ResponseError::NotOk)));
    }

    #[test]
    fn info_without_any_version_field_is_rejected() {
        let body =
            r#"{"_ok": true, "uid": "DX5-0042-AB12", "hardware": "devkit", "hw_ver": "1.2"}"#;
        assert!(matches!(
            SensorInfo::from_json(body),
            Err(ResponseError::MissingField("sw_ver"))
        ));
    }

    #[test]
    fn html_error_page_is_invalid_json() {
        // Some firmware builds answer management URLs with an HTML error page
        // while the subsystem is restarting.
        let body = "<html><body><h1>503 Service Unavailable</h1></body></html>";
        assert!(matches!(
            SensorInfo::from_json(body),
            Err(ResponseError::Json(_))
        ));
        assert!(matches!(parse_ack(body), Err(ResponseError::Json(_))));
    }
}
