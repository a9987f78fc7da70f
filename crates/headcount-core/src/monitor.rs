// ── Monitor ──
//
// Lifecycle owner for a running ingestion pipeline: the engine task, the
// sink writer, one supervisor per camera, the fallback poller and the
// reset scheduler. All of them share one cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DeviceSource, MonitorConfig};
use crate::engine::{Engine, EngineHandle, Reconciler};
use crate::error::CoreError;
use crate::poller::{PolledDevice, run_poller};
use crate::scheduler::run_reset_scheduler;
use crate::sink::{EventSink, run_sink_writer};
use crate::supervisor::{Backoff, Supervisor, SupervisorState};

/// One camera's supervisor state, as seen from outside.
#[derive(Clone)]
pub struct DeviceStatus {
    pub name: String,
    pub state: watch::Receiver<SupervisorState>,
}

/// A running pipeline.
///
/// Cheaply cloneable. Build with [`Monitor::start`]; stop with
/// [`Monitor::shutdown`].
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    engine: EngineHandle,
    devices: Vec<DeviceStatus>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Spawn every task. Must be called inside a tokio runtime.
    ///
    /// Fails only when a camera client cannot be built (bad URL, bad TLS
    /// material); unreachable cameras are retried in the background.
    pub fn start<S: EventSink>(config: MonitorConfig, sink: S) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let devices: Vec<Arc<DeviceSource>> = config.devices.into_iter().map(Arc::new).collect();

        // Build every client up front so a config error spawns nothing.
        let clients = devices
            .iter()
            .map(|d| d.client(&config.transport))
            .collect::<Result<Vec<_>, _>>()?;
        let poll_clients = if config.poll_interval.is_zero() {
            Vec::new()
        } else {
            devices
                .iter()
                .map(|d| d.client(&config.transport))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut handles = Vec::new();

        let (sink_tx, sink_rx) = mpsc::unbounded_channel();
        handles.push(tokio::spawn(run_sink_writer(sink, sink_rx)));

        let reconciler = Reconciler::new(devices.iter().map(AsRef::as_ref));
        let (engine, handle) = Engine::new(reconciler, sink_tx);
        handles.push(tokio::spawn(engine.run(cancel.clone())));

        let mut statuses = Vec::with_capacity(devices.len());
        for (device, client) in devices.iter().zip(clients) {
            let supervisor = Supervisor::new(
                Arc::clone(device),
                client,
                config.heartbeat_secs,
                Backoff::new(config.backoff_floor, config.backoff_ceiling),
                handle.event_sender(),
            );
            statuses.push(DeviceStatus {
                name: device.name.clone(),
                state: supervisor.state(),
            });
            handles.push(tokio::spawn(supervisor.run(cancel.clone())));
        }

        if !poll_clients.is_empty() {
            let polled = devices
                .iter()
                .zip(poll_clients)
                .map(|(device, client)| PolledDevice {
                    device: Arc::clone(device),
                    client,
                })
                .collect();
            handles.push(tokio::spawn(run_poller(
                polled,
                config.poll_interval,
                handle.event_sender(),
                cancel.clone(),
            )));
        }

        if let Some(schedule) = config.reset {
            handles.push(tokio::spawn(run_reset_scheduler(
                schedule,
                handle.clone(),
                cancel.clone(),
            )));
        }

        info!(
            cameras = devices.len(),
            poll_secs = config.poll_interval.as_secs(),
            reset = config.reset.is_some(),
            "monitor started"
        );

        Ok(Self {
            inner: Arc::new(MonitorInner {
                engine: handle,
                devices: statuses,
                cancel,
                task_handles: Mutex::new(handles),
            }),
        })
    }

    /// Handle to the reconciliation engine (reads and corrections).
    pub fn engine(&self) -> &EngineHandle {
        &self.inner.engine
    }

    /// Per-camera supervisor state, in configuration order.
    pub fn devices(&self) -> &[DeviceStatus] {
        &self.inner.devices
    }

    /// Cancel every task and wait for all of them.
    ///
    /// The sink writer finishes the queued records before it exits.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "task ended abnormally");
            }
        }
        debug!("monitor stopped");
    }

    /// Like [`shutdown`](Self::shutdown), but gives up after `grace`.
    ///
    /// Returns `false` if some task was still running.
    pub async fn shutdown_within(&self, grace: Duration) -> bool {
        tokio::time::timeout(grace, self.shutdown()).await.is_ok()
    }
}
