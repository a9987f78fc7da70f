//! `headcount run`: the long-running ingestion daemon.

use std::time::Duration;

use headcount_core::{
    EventSink, JsonLinesSink, Monitor, PeopleEvent, ResetLog, SinkError, TracingSink,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;

// ── Sink selection ───────────────────────────────────────────────────

/// JSON-lines file when a path is configured, log lines otherwise.
enum RunSink {
    File(JsonLinesSink),
    Log(TracingSink),
}

impl EventSink for RunSink {
    async fn record_event(&self, event: &PeopleEvent) -> Result<(), SinkError> {
        match self {
            Self::File(sink) => sink.record_event(event).await,
            Self::Log(sink) => sink.record_event(event).await,
        }
    }

    async fn record_audit(&self, log: &ResetLog) -> Result<(), SinkError> {
        match self {
            Self::File(sink) => sink.record_audit(log).await,
            Self::Log(sink) => sink.record_audit(log).await,
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, overrides) = super::load(global)?;
    let monitor_config = headcount_config::to_monitor_config(&config, &overrides)?;

    let sink = match args.sink.or(config.sink.path) {
        Some(path) => {
            let sink = JsonLinesSink::open(&path).await?;
            info!(path = %sink.path().display(), "writing events to file");
            RunSink::File(sink)
        }
        None => RunSink::Log(TracingSink),
    };

    let monitor = Monitor::start(monitor_config, sink)?;

    let watchers = watch_states(&monitor);

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    let grace = Duration::from_secs(args.grace_secs);
    if !monitor.shutdown_within(grace).await {
        warn!(grace_secs = args.grace_secs, "tasks did not stop in time");
    }
    for handle in watchers {
        handle.abort();
    }

    let last = monitor.engine().get_snapshot();
    info!(occupancy = last.total, offset = last.offset, "stopped");
    Ok(())
}

// ── State logging ───────────────────────────────────────────────────

/// Log every occupancy change and every supervisor transition.
fn watch_states(monitor: &Monitor) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    let mut snapshots = monitor.engine().subscribe_snapshots();
    handles.push(tokio::spawn(async move {
        while let Some(snapshot) = snapshots.changed().await {
            let per_camera: Vec<String> = snapshot
                .per_camera
                .iter()
                .map(|c| format!("{}={}", c.camera, c.occupancy))
                .collect();
            info!(
                occupancy = snapshot.total,
                offset = snapshot.offset,
                cameras = %per_camera.join(" "),
                "occupancy changed"
            );
        }
    }));

    for device in monitor.devices() {
        let name = device.name.clone();
        let mut state = device.state.clone();
        handles.push(tokio::spawn(async move {
            while state.changed().await.is_ok() {
                let current = state.borrow_and_update().clone();
                info!(device = %name, state = %current, "camera state");
            }
        }));
    }

    handles
}
