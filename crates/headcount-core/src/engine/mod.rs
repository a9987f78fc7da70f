// ── Reconciliation engine ──
//
// One tokio task owns the `Reconciler`. Device events and correction
// commands arrive on separate mpsc queues and are applied one at a time;
// after every mutation the engine republishes the snapshot and the debug
// rows on `watch` channels, so reads never wait on the task.

mod reconciler;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{ChannelDebug, DeviceEvent, OccupancySnapshot, ResetLog, SinkRecord};
use crate::stream::SnapshotStream;

pub use reconciler::{ChannelState, Reconciler, SCHEDULED_RESET};

const EVENT_CHANNEL_SIZE: usize = 256;
const COMMAND_CHANNEL_SIZE: usize = 16;

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug)]
enum EngineCommand {
    SetOccupancy { target: i64, reason: String },
    Reset { reason: String },
}

struct CommandEnvelope {
    command: EngineCommand,
    response_tx: oneshot::Sender<Option<ResetLog>>,
}

// ── EngineHandle ─────────────────────────────────────────────────────

/// Cheap, cloneable access to a running engine.
///
/// Reads are served from the last published snapshot; mutations are
/// queued and, for corrections, awaited.
#[derive(Clone)]
pub struct EngineHandle {
    events: mpsc::Sender<DeviceEvent>,
    commands: mpsc::Sender<CommandEnvelope>,
    snapshot: watch::Receiver<Arc<OccupancySnapshot>>,
    debug: watch::Receiver<Arc<Vec<ChannelDebug>>>,
}

impl EngineHandle {
    /// Sender for device events, handed to supervisors and the poller.
    pub fn event_sender(&self) -> mpsc::Sender<DeviceEvent> {
        self.events.clone()
    }

    /// Queue one device event.
    pub async fn apply(&self, event: DeviceEvent) -> Result<(), CoreError> {
        self.events
            .send(event)
            .await
            .map_err(|_| CoreError::EngineStopped)
    }

    /// Correct the occupancy total to `target`.
    ///
    /// Returns the audit row, or `None` if the total already matched.
    pub async fn set_occupancy(
        &self,
        target: i64,
        reason: &str,
    ) -> Result<Option<ResetLog>, CoreError> {
        self.execute(EngineCommand::SetOccupancy {
            target,
            reason: reason.to_owned(),
        })
        .await
    }

    /// Correct the occupancy total to zero.
    pub async fn reset_occupancy(&self, reason: &str) -> Result<Option<ResetLog>, CoreError> {
        self.execute(EngineCommand::Reset {
            reason: reason.to_owned(),
        })
        .await
    }

    async fn execute(&self, command: EngineCommand) -> Result<Option<ResetLog>, CoreError> {
        let (tx, rx) = oneshot::channel();

        self.commands
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::EngineStopped)?;

        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    /// Latest occupancy, stamped with the current time.
    pub fn get_snapshot(&self) -> OccupancySnapshot {
        let mut snapshot = OccupancySnapshot::clone(&self.snapshot.borrow());
        snapshot.timestamp = Utc::now();
        snapshot
    }

    /// Raw per-channel readings.
    pub fn get_debug_state(&self) -> Vec<ChannelDebug> {
        Vec::clone(&self.debug.borrow())
    }

    /// Subscribe to every republished snapshot.
    pub fn subscribe_snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.clone())
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// The engine task state. Create with [`Engine::new`], then spawn
/// [`Engine::run`].
pub struct Engine {
    reconciler: Reconciler,
    events: mpsc::Receiver<DeviceEvent>,
    commands: mpsc::Receiver<CommandEnvelope>,
    snapshot_tx: watch::Sender<Arc<OccupancySnapshot>>,
    debug_tx: watch::Sender<Arc<Vec<ChannelDebug>>>,
    sink_tx: mpsc::UnboundedSender<SinkRecord>,
}

impl Engine {
    /// Wrap `reconciler`; records for persistence go to `sink_tx`.
    pub fn new(
        reconciler: Reconciler,
        sink_tx: mpsc::UnboundedSender<SinkRecord>,
    ) -> (Self, EngineHandle) {
        let (events_tx, events) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (commands_tx, commands) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let now = Utc::now();
        let (snapshot_tx, snapshot) = watch::channel(Arc::new(reconciler.snapshot(now)));
        let (debug_tx, debug) = watch::channel(Arc::new(reconciler.debug_state()));

        let handle = EngineHandle {
            events: events_tx,
            commands: commands_tx,
            snapshot,
            debug,
        };
        let engine = Self {
            reconciler,
            events,
            commands,
            snapshot_tx,
            debug_tx,
            sink_tx,
        };
        (engine, handle)
    }

    /// Drain both queues until cancelled or every handle is dropped.
    ///
    /// Pending commands are served before pending device events.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(envelope) = self.commands.recv() => {
                    let result = self.execute(envelope.command);
                    let _ = envelope.response_tx.send(result);
                }
                Some(event) = self.events.recv() => self.apply(event),
                else => break,
            }
        }
        debug!("reconciliation engine stopped");
    }

    fn apply(&mut self, event: DeviceEvent) {
        let now = Utc::now();

        match event {
            DeviceEvent::Counters {
                channel,
                entered,
                exited,
            } => {
                if !self.reconciler.knows(channel) {
                    debug!(channel, "counters for unconfigured channel ignored");
                    return;
                }
                for event in self.reconciler.apply_counters(channel, entered, exited, now) {
                    info!(
                        camera = %event.camera,
                        channel,
                        direction = %event.direction,
                        delta = event.delta,
                        occupancy = event.occupancy,
                        "people flow"
                    );
                    self.persist(SinkRecord::Event(event));
                }
            }
            DeviceEvent::Gauge { channel, inside } => {
                if !self.reconciler.apply_gauge(channel, inside) {
                    debug!(channel, "gauge for unconfigured channel ignored");
                    return;
                }
            }
        }

        self.publish(now);
    }

    fn execute(&mut self, command: EngineCommand) -> Option<ResetLog> {
        let now = Utc::now();
        let log = match command {
            EngineCommand::SetOccupancy { target, reason } => {
                self.reconciler.manual_set(target, &reason, now)
            }
            EngineCommand::Reset { reason } => self.reconciler.reset(&reason, now),
        };

        match &log {
            Some(log) => {
                info!(
                    reason = %log.reason,
                    offset = log.offset_after,
                    "occupancy corrected"
                );
                self.persist(SinkRecord::Audit(log.clone()));
                self.publish(now);
            }
            None => debug!("occupancy already at target, no correction"),
        }
        log
    }

    fn persist(&self, record: SinkRecord) {
        if self.sink_tx.send(record).is_err() {
            warn!("sink writer gone, record dropped");
        }
    }

    fn publish(&self, at: DateTime<Utc>) {
        self.snapshot_tx
            .send_replace(Arc::new(self.reconciler.snapshot(at)));
        self.debug_tx
            .send_replace(Arc::new(self.reconciler.debug_state()));
    }
}
