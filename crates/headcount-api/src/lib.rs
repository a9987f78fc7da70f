// headcount-api: Async client for people-counting cameras (attach stream + getSummary)

pub mod attach;
pub mod client;
mod digest;
pub mod error;
pub mod transport;
pub mod wire;

pub use attach::{AttachRecord, SummaryCounters, classify_block, summary_counters};
pub use client::{AttachStream, DeviceClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
