// ── Connection supervisor ──
//
// One task per camera: connect → stream → on failure, back off →
// reconnect. Retries forever; only cancellation stops it. State changes
// are published on a `watch` channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use headcount_api::{AttachRecord, DeviceClient, Error};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::DeviceSource;
use crate::model::DeviceEvent;

// ── SupervisorState ──────────────────────────────────────────────────

/// Lifecycle of one camera connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Connecting,
    Streaming,
    /// Waiting `delay` before reconnect attempt number `attempt`.
    Backoff { delay: Duration, attempt: u32 },
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Streaming => f.write_str("streaming"),
            Self::Backoff { delay, attempt } => {
                write!(f, "backoff {}s (attempt {attempt})", delay.as_secs())
            }
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

// ── Backoff ──────────────────────────────────────────────────────────

/// Doubling reconnect delay between `floor` and `ceiling`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// Delay the next failure will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Back to the floor (a stream was established).
    pub fn reset(&mut self) {
        self.current = self.floor;
    }

    /// Return the delay to wait now and double the next one, capped.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

// ── Supervisor ───────────────────────────────────────────────────────

/// Keeps one camera's attach stream alive and forwards its readings.
pub struct Supervisor {
    device: Arc<DeviceSource>,
    client: DeviceClient,
    heartbeat_secs: u64,
    backoff: Backoff,
    events: mpsc::Sender<DeviceEvent>,
    state: watch::Sender<SupervisorState>,
}

/// Why a single streaming session ended.
enum SessionEnd {
    Failed(Error),
    EngineGone,
}

impl Supervisor {
    pub fn new(
        device: Arc<DeviceSource>,
        client: DeviceClient,
        heartbeat_secs: u64,
        backoff: Backoff,
        events: mpsc::Sender<DeviceEvent>,
    ) -> Self {
        let (state, _) = watch::channel(SupervisorState::Connecting);
        Self {
            device,
            client,
            heartbeat_secs,
            backoff,
            events,
            state,
        }
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires (or the engine goes away).
    ///
    /// Cancellation aborts an in-flight connect or read and wakes a
    /// backoff sleep immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            self.state.send_replace(SupervisorState::Connecting);

            let end = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                end = self.stream_once(&mut attempt) => end,
            };

            let err = match end {
                SessionEnd::EngineGone => {
                    debug!(device = %self.device.name, "engine queue closed");
                    break;
                }
                SessionEnd::Failed(err) => err,
            };

            attempt = attempt.saturating_add(1);
            let delay = self.backoff.advance();
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            if err.is_auth_failure() {
                error!(
                    device = %self.device.name,
                    host = %self.device.host,
                    error = %err,
                    attempt,
                    delay_ms,
                    "camera rejected credentials"
                );
            } else {
                warn!(
                    device = %self.device.name,
                    host = %self.device.host,
                    error = %err,
                    attempt,
                    delay_ms,
                    "attach stream failed, reconnecting"
                );
            }

            self.state
                .send_replace(SupervisorState::Backoff { delay, attempt });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(SupervisorState::Stopped);
        debug!(device = %self.device.name, "supervisor stopped");
    }

    /// One connect + read session. Only returns when it is over.
    async fn stream_once(&mut self, attempt: &mut u32) -> SessionEnd {
        let channel = self.device.attach_channel;
        debug!(device = %self.device.name, attach_channel = channel, "connecting");

        let mut stream = match self.client.attach(channel, self.heartbeat_secs).await {
            Ok(stream) => stream,
            Err(e) => return SessionEnd::Failed(e),
        };

        info!(
            device = %self.device.name,
            attach_channel = channel,
            channel = self.device.logical_channel,
            "attach stream established"
        );
        self.backoff.reset();
        *attempt = 0;
        self.state.send_replace(SupervisorState::Streaming);

        loop {
            let record = match stream.next_record().await {
                Ok(record) => record,
                Err(e) => return SessionEnd::Failed(e),
            };
            if let Some(event) = self.translate(record) {
                if self.events.send(event).await.is_err() {
                    return SessionEnd::EngineGone;
                }
            }
        }
    }

    fn translate(&self, record: AttachRecord) -> Option<DeviceEvent> {
        let channel = self.device.logical_channel;
        match record {
            AttachRecord::Heartbeat => {
                trace!(device = %self.device.name, "heartbeat");
                None
            }
            AttachRecord::Counters { entered, exited } => {
                debug!(device = %self.device.name, channel, entered, exited, "counters");
                Some(DeviceEvent::Counters {
                    channel,
                    entered,
                    exited,
                })
            }
            AttachRecord::Inside { total } => {
                debug!(device = %self.device.name, channel, inside = total, "gauge");
                Some(DeviceEvent::Gauge {
                    channel,
                    inside: total,
                })
            }
            AttachRecord::Ignored { rule } => {
                trace!(device = %self.device.name, ?rule, "block ignored");
                None
            }
            AttachRecord::Malformed { rule, reason } => {
                warn!(device = %self.device.name, rule, %reason, "malformed block dropped");
                None
            }
        }
    }
}
