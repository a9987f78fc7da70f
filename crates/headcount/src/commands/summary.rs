//! `headcount summary`: one-shot `getSummary` against every camera.

use futures_util::future::join_all;
use headcount_core::CoreError;
use headcount_core::poller::fetch_counters;
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct CameraSummary {
    camera: String,
    host: String,
    logical_channel: u32,
    entered: Option<i64>,
    exited: Option<i64>,
    inside: Option<i64>,
    error: Option<String>,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Camera")]
    camera: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Ch")]
    channel: u32,
    #[tabled(rename = "Entered")]
    entered: String,
    #[tabled(rename = "Exited")]
    exited: String,
    #[tabled(rename = "Inside")]
    inside: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn cell(value: Option<i64>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn to_row(s: &CameraSummary) -> SummaryRow {
    let status = match (&s.error, s.entered) {
        (Some(e), _) => e.clone(),
        (None, Some(_)) => "ok".into(),
        (None, None) => "no counters".into(),
    };
    SummaryRow {
        camera: s.camera.clone(),
        host: s.host.clone(),
        channel: s.logical_channel,
        entered: cell(s.entered),
        exited: cell(s.exited),
        inside: cell(s.inside),
        status,
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (config, overrides) = super::load(global)?;
    let monitor_config = headcount_config::to_monitor_config(&config, &overrides)?;

    let transport = &monitor_config.transport;
    let polls = monitor_config.devices.iter().map(|device| async move {
        let result = match device.client(transport) {
            Ok(client) => fetch_counters(device, &client).await,
            Err(e) => Err(e),
        };
        (device, result)
    });

    let mut first_error: Option<CoreError> = None;
    let mut summaries = Vec::new();
    for (device, result) in join_all(polls).await {
        let mut summary = CameraSummary {
            camera: device.name.clone(),
            host: format!("{}:{}", device.host, device.port),
            logical_channel: device.logical_channel,
            entered: None,
            exited: None,
            inside: None,
            error: None,
        };
        match result {
            Ok(Some(counters)) => {
                summary.entered = Some(counters.entered);
                summary.exited = Some(counters.exited);
                summary.inside = counters.inside;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(device = %device.name, error = %e, "summary failed");
                summary.error = Some(e.to_string());
                first_error.get_or_insert(e);
            }
        }
        summaries.push(summary);
    }

    let rendered = output::render_list(global.output, &summaries, to_row)?;
    output::print_output(&rendered, global.quiet);

    // Partial answers are still an answer; fail only when no camera replied.
    match first_error {
        Some(e) if summaries.iter().all(|s| s.error.is_some()) => Err(e.into()),
        _ => Ok(()),
    }
}
