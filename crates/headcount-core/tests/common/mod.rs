#![allow(dead_code, clippy::unwrap_used)]
// Shared helpers for headcount-core integration tests.

use std::time::Duration;

use headcount_api::{DeviceClient, TransportConfig};
use headcount_core::DeviceSource;
use secrecy::SecretString;
use wiremock::MockServer;

pub const CGI: &str = "/cgi-bin/videoStatServer.cgi";
pub const MULTIPART: &str = "multipart/x-mixed-replace; boundary=myboundary";

/// A camera pointing at the mock server.
pub fn device(server: &MockServer, name: &str, logical_channel: u32) -> DeviceSource {
    let addr = server.address();
    DeviceSource {
        name: name.into(),
        host: addr.ip().to_string(),
        port: addr.port(),
        username: "admin".into(),
        password: SecretString::from("s3cret".to_string()),
        logical_channel,
        attach_channel: 1,
        flow_weight: 1,
        gauge_weight: 1,
        rule_area: Some("PC-1".into()),
    }
}

pub fn transport() -> TransportConfig {
    TransportConfig {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        idle_timeout: Duration::from_secs(2),
        ..TransportConfig::default()
    }
}

pub fn client(device: &DeviceSource) -> DeviceClient {
    device.client(&transport()).unwrap()
}

/// Multipart body with one block per entry, closed by a final boundary.
pub fn multipart(bodies: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for body in bodies {
        out.extend_from_slice(
            format!("--myboundary\r\nContent-Type: text/plain\r\n\r\n{body}\r\n\r\n").as_bytes(),
        );
    }
    out.extend_from_slice(b"--myboundary\r\n");
    out
}

pub fn number_stat(entered: i64, exited: i64) -> String {
    format!(
        "summary.RuleName=NumberStat\r\nsummary.EnteredSubtotal.Today={entered}\r\nsummary.ExitedSubtotal.Today={exited}"
    )
}
