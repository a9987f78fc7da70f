// ── Occupancy domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Flow direction of a counted person.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Entry,
    Exit,
}

/// A typed observation from a camera, queued to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Cumulative entered/exited counters as currently reported.
    Counters {
        channel: u32,
        entered: i64,
        exited: i64,
    },
    /// "People currently inside" reading.
    Gauge { channel: u32, inside: i64 },
}

impl DeviceEvent {
    /// Logical channel this event belongs to.
    pub fn channel(&self) -> u32 {
        match self {
            Self::Counters { channel, .. } | Self::Gauge { channel, .. } => *channel,
        }
    }
}

/// One observed non-zero flow. Append-only; never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub camera: String,
    pub logical_channel: u32,
    pub direction: Direction,
    /// Always strictly positive.
    pub delta: i64,
    /// Raw cumulative counters at observation time.
    pub entered_total: i64,
    pub exited_total: i64,
    /// Occupancy total right after this observation was applied.
    pub occupancy: i64,
}

/// Audit row for a manual correction or scheduled reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetLog {
    pub timestamp: DateTime<Utc>,
    /// Reference camera the offset is attributed to.
    pub camera: Option<String>,
    /// `"<REASON>: <target>"`.
    pub reason: String,
    pub success: bool,
    pub error: Option<String>,
    pub offset_before: i64,
    pub offset_after: i64,
}

/// Occupancy contribution of one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOccupancy {
    pub camera: String,
    pub logical_channel: u32,
    pub occupancy: i64,
}

/// Point-in-time occupancy. `per_camera` always sums to `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub timestamp: DateTime<Utc>,
    pub total: i64,
    pub per_camera: Vec<CameraOccupancy>,
    pub offset: i64,
    pub last_correction: Option<DateTime<Utc>>,
}

/// Raw per-channel state, as exposed for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDebug {
    pub logical_channel: u32,
    pub camera: String,
    pub last_entered: i64,
    pub last_exited: i64,
    pub inside_total: i64,
}

/// Record handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkRecord {
    Event(PeopleEvent),
    Audit(ResetLog),
}
