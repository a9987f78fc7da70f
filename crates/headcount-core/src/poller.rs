// ── Fallback poller ──
//
// Periodic one-shot `getSummary` per camera, in case the attach stream
// misses updates. Results go to the engine as ordinary counter events;
// absolute-snapshot diffing makes duplicates harmless.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use headcount_api::{DeviceClient, SummaryCounters, summary_counters};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DeviceSource;
use crate::error::CoreError;
use crate::model::DeviceEvent;

/// Read one camera's counters.
///
/// Asks with the configured rule-area filter first; if that yields no
/// usable entered/exited fields or fails in any way, asks once more
/// without it. The first usable answer wins, and only the unfiltered
/// request's failure is returned. `Ok(None)` means the camera answered
/// but never with counters.
pub async fn fetch_counters(
    device: &DeviceSource,
    client: &DeviceClient,
) -> Result<Option<SummaryCounters>, CoreError> {
    let channel = device.attach_channel;

    if let Some(area) = device.rule_area.as_deref() {
        match client.get_summary(channel, Some(area)).await {
            Ok(record) => {
                if let Some(counters) = summary_counters(&record) {
                    return Ok(Some(counters));
                }
                debug!(device = %device.name, rule_area = area, "filtered summary has no counters");
            }
            Err(e) => {
                debug!(
                    device = %device.name,
                    rule_area = area,
                    error = %e,
                    "filtered summary failed"
                );
            }
        }
    }

    let record = client.get_summary(channel, None).await?;
    Ok(summary_counters(&record))
}

/// A camera as the poller sees it.
pub struct PolledDevice {
    pub device: Arc<DeviceSource>,
    pub client: DeviceClient,
}

/// Poll every camera each `interval` until cancelled.
///
/// The first cycle runs one interval after start. Cameras are polled
/// concurrently; one failing camera never holds up or aborts the others.
pub async fn run_poller(
    devices: Vec<PolledDevice>,
    interval: Duration,
    events: mpsc::Sender<DeviceEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    alive = poll_cycle(&devices, &events) => {
                        if !alive {
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("poller stopped");
}

/// One pass over every camera. Returns `false` once the engine is gone.
async fn poll_cycle(devices: &[PolledDevice], events: &mpsc::Sender<DeviceEvent>) -> bool {
    let results = join_all(
        devices
            .iter()
            .map(|d| async move { (d, fetch_counters(&d.device, &d.client).await) }),
    )
    .await;

    for (polled, result) in results {
        let device = &polled.device;
        match result {
            Ok(Some(counters)) => {
                debug!(
                    device = %device.name,
                    channel = device.logical_channel,
                    entered = counters.entered,
                    exited = counters.exited,
                    "polled counters"
                );
                let event = DeviceEvent::Counters {
                    channel: device.logical_channel,
                    entered: counters.entered,
                    exited: counters.exited,
                };
                if events.send(event).await.is_err() {
                    return false;
                }
            }
            Ok(None) => {
                warn!(device = %device.name, "summary has no entered/exited fields");
            }
            Err(e) => {
                warn!(device = %device.name, host = %device.host, error = %e, "summary poll failed");
            }
        }
    }
    true
}
