// headcount-core: Occupancy reconciliation between headcount-api and consumers (CLI/daemon).

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod scheduler;
pub mod sink;
pub mod stream;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DeviceSource, MonitorConfig, ResetSchedule};
pub use engine::{ChannelState, Engine, EngineHandle, Reconciler, SCHEDULED_RESET};
pub use error::{CoreError, SinkError};
pub use model::{
    CameraOccupancy, ChannelDebug, DeviceEvent, Direction, OccupancySnapshot, PeopleEvent,
    ResetLog, SinkRecord,
};
pub use monitor::{DeviceStatus, Monitor};
pub use sink::{EventSink, JsonLinesSink, MemorySink, TracingSink};
pub use stream::SnapshotStream;
pub use supervisor::{Backoff, Supervisor, SupervisorState};
