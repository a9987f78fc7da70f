// ── Persistence sinks ──
//
// The engine never waits on storage: records go onto an unbounded queue
// and a dedicated writer task hands them to an `EventSink`. A failed
// write is logged and dropped; in-memory state is not rolled back.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::error::SinkError;
use crate::model::{PeopleEvent, ResetLog, SinkRecord};

/// Destination for flow events and audit rows.
pub trait EventSink: Send + Sync + 'static {
    fn record_event(
        &self,
        event: &PeopleEvent,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    fn record_audit(&self, log: &ResetLog) -> impl Future<Output = Result<(), SinkError>> + Send;
}

// ── Writer task ──────────────────────────────────────────────────────

/// Hand every queued record to `sink` until the engine drops its sender.
///
/// Runs to the end of the queue so records produced before shutdown are
/// still written.
pub async fn run_sink_writer<S: EventSink>(sink: S, mut records: mpsc::UnboundedReceiver<SinkRecord>) {
    while let Some(record) = records.recv().await {
        let result = match &record {
            SinkRecord::Event(event) => sink.record_event(event).await,
            SinkRecord::Audit(log) => sink.record_audit(log).await,
        };
        if let Err(e) = result {
            warn!(error = %e, ?record, "failed to persist record");
        }
    }
    debug!("sink writer stopped");
}

// ── JsonLinesSink ────────────────────────────────────────────────────

/// Append-only JSON lines file; one tagged object per record.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonLinesSink {
    /// Open (or create) `path` for appending, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        debug!(path = %path.display(), "json lines sink opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &SinkRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

impl EventSink for JsonLinesSink {
    async fn record_event(&self, event: &PeopleEvent) -> Result<(), SinkError> {
        self.append(&SinkRecord::Event(event.clone())).await
    }

    async fn record_audit(&self, log: &ResetLog) -> Result<(), SinkError> {
        self.append(&SinkRecord::Audit(log.clone())).await
    }
}

// ── TracingSink ──────────────────────────────────────────────────────

/// Logs records and keeps nothing. Used when no file is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    async fn record_event(&self, event: &PeopleEvent) -> Result<(), SinkError> {
        info!(
            target: "headcount::events",
            id = %event.id,
            camera = %event.camera,
            direction = %event.direction,
            delta = event.delta,
            entered_total = event.entered_total,
            exited_total = event.exited_total,
            occupancy = event.occupancy,
            "people event"
        );
        Ok(())
    }

    async fn record_audit(&self, log: &ResetLog) -> Result<(), SinkError> {
        info!(
            target: "headcount::events",
            camera = log.camera.as_deref().unwrap_or("-"),
            reason = %log.reason,
            offset_before = log.offset_before,
            offset_after = log.offset_after,
            "occupancy audit"
        );
        Ok(())
    }
}

// ── MemorySink ───────────────────────────────────────────────────────

/// Keeps every record in memory. Clones share the same storage.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<SinkRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in arrival order.
    pub async fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().await.clone()
    }

    pub async fn events(&self) -> Vec<PeopleEvent> {
        self.records
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Event(e) => Some(e.clone()),
                SinkRecord::Audit(_) => None,
            })
            .collect()
    }

    pub async fn audits(&self) -> Vec<ResetLog> {
        self.records
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Audit(l) => Some(l.clone()),
                SinkRecord::Event(_) => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    async fn record_event(&self, event: &PeopleEvent) -> Result<(), SinkError> {
        self.records
            .lock()
            .await
            .push(SinkRecord::Event(event.clone()));
        Ok(())
    }

    async fn record_audit(&self, log: &ResetLog) -> Result<(), SinkError> {
        self.records
            .lock()
            .await
            .push(SinkRecord::Audit(log.clone()));
        Ok(())
    }
}
