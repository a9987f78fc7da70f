// ── Runtime monitor configuration ──
//
// These types describe *what* to watch and how hard to retry. They carry
// credentials and tuning but never touch disk: headcount-config builds a
// `MonitorConfig` and hands it in.

use std::time::Duration;

use chrono::NaiveTime;
use headcount_api::{DeviceClient, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// One people-counting camera.
///
/// Immutable once built; shared read-only between the supervisor and the
/// poller through an `Arc`.
#[derive(Debug, Clone)]
pub struct DeviceSource {
    /// Display name, used in logs and persisted records (e.g. `D4`).
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Channel the reconciliation engine keys this camera's state on.
    pub logical_channel: u32,
    /// Channel number sent to the camera in `attach` / `getSummary`.
    pub attach_channel: u32,
    /// Weight of `entered - exited` in the occupancy total.
    pub flow_weight: i64,
    /// Weight of the inside gauge in the occupancy total.
    pub gauge_weight: i64,
    /// Rule area passed as `name=` to `getSummary`, if any.
    pub rule_area: Option<String>,
}

impl DeviceSource {
    /// Camera base URL (`http://host:port/`).
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Ok(DeviceClient::http_base_url(&self.host, self.port)?)
    }

    /// Build the HTTP client for this camera.
    pub fn client(&self, transport: &TransportConfig) -> Result<DeviceClient, CoreError> {
        Ok(DeviceClient::new(
            self.base_url()?,
            self.username.clone(),
            self.password.clone(),
            transport,
        )?)
    }
}

/// Daily wall-clock time at which occupancy is reset to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    /// Local time of day.
    pub at: NaiveTime,
}

impl ResetSchedule {
    /// Schedule at `hour:minute` local time, or `None` if out of range.
    pub fn daily(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self { at })
    }
}

/// Everything the [`Monitor`](crate::monitor::Monitor) needs to run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Cameras in configuration order. The first one is the reference
    /// camera the manual offset is attributed to.
    pub devices: Vec<DeviceSource>,
    pub transport: TransportConfig,
    /// `heartbeat=` interval requested on the attach stream.
    pub heartbeat_secs: u64,
    /// Fallback poll interval. `Duration::ZERO` disables the poller.
    pub poll_interval: Duration,
    /// First reconnect delay after a stream failure.
    pub backoff_floor: Duration,
    /// Upper bound on the reconnect delay.
    pub backoff_ceiling: Duration,
    /// Daily reset, if enabled.
    pub reset: Option<ResetSchedule>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            transport: TransportConfig::default(),
            heartbeat_secs: 5,
            poll_interval: Duration::from_secs(60),
            backoff_floor: Duration::from_secs(1),
            backoff_ceiling: Duration::from_secs(60),
            reset: ResetSchedule::daily(3, 0),
        }
    }
}
