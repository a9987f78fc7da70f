// Record classification for the people-counting protocol.
//
// Turns one decoded record (attach block body or getSummary response)
// into a typed value. Nothing here touches the network; the client and
// the core's stream reader feed text in and act on the result.

use crate::wire::{KeyValues, parse_key_value_text};

/// Body of the keep-alive block the camera sends every `heartbeat` seconds.
pub const HEARTBEAT: &str = "Heartbeat";

/// Rule that reports cumulative entered/exited counters.
pub const RULE_NUMBER_STAT: &str = "NumberStat";

/// Rule that reports a "people currently inside" gauge.
pub const RULE_MAN_NUM_DETECTION: &str = "ManNumDetection";

/// Field names consumed from the camera's records.
pub mod fields {
    pub const RULE_NAME: &str = "summary.RuleName";
    pub const ENTERED_TODAY: &str = "summary.EnteredSubtotal.Today";
    pub const ENTERED_TOTAL: &str = "summary.EnteredSubtotal.Total";
    pub const EXITED_TODAY: &str = "summary.ExitedSubtotal.Today";
    pub const EXITED_TOTAL: &str = "summary.ExitedSubtotal.Total";
    pub const INSIDE_TOTAL: &str = "summary.InsideSubtotal.Total";
}

// ── AttachRecord ─────────────────────────────────────────────────────

/// One classified attach-stream block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachRecord {
    /// Keep-alive, carries no data.
    Heartbeat,

    /// `NumberStat`: cumulative counters as reported right now.
    Counters { entered: i64, exited: i64 },

    /// `ManNumDetection`: current number of people in the area.
    Inside { total: i64 },

    /// A rule with no ingestion meaning (or no rule name at all).
    Ignored { rule: Option<String> },

    /// A known rule whose required fields are missing or not numeric.
    Malformed { rule: &'static str, reason: String },
}

/// Classify one attach block body.
pub fn classify_block(body: &str) -> AttachRecord {
    let body = body.trim();
    if body == HEARTBEAT {
        return AttachRecord::Heartbeat;
    }

    let record = parse_key_value_text(body);

    match record.get(fields::RULE_NAME).map(String::as_str) {
        Some(RULE_NUMBER_STAT) => match counters(&record) {
            Ok((entered, exited)) => AttachRecord::Counters { entered, exited },
            Err(reason) => AttachRecord::Malformed {
                rule: RULE_NUMBER_STAT,
                reason,
            },
        },
        Some(RULE_MAN_NUM_DETECTION) => match number(&record, fields::INSIDE_TOTAL, None) {
            Ok(total) => AttachRecord::Inside { total },
            Err(reason) => AttachRecord::Malformed {
                rule: RULE_MAN_NUM_DETECTION,
                reason,
            },
        },
        other => AttachRecord::Ignored {
            rule: other.map(str::to_owned),
        },
    }
}

// ── Summary ──────────────────────────────────────────────────────────

/// Counters read from a `getSummary` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCounters {
    pub entered: i64,
    pub exited: i64,
    /// Present only when the rule also tracks an inside gauge.
    pub inside: Option<i64>,
}

/// Extract counters from a summary record.
///
/// Summary responses do not always name the rule, so no rule check is
/// made. Returns `None` when entered/exited are missing or any consumed
/// field is not numeric.
pub fn summary_counters(record: &KeyValues) -> Option<SummaryCounters> {
    let (entered, exited) = counters(record).ok()?;
    let inside = match lookup(record, fields::INSIDE_TOTAL, None) {
        Some(raw) => Some(i64::from(raw.parse::<u32>().ok()?)),
        None => None,
    };
    Some(SummaryCounters {
        entered,
        exited,
        inside,
    })
}

// ── Field helpers ────────────────────────────────────────────────────

fn counters(record: &KeyValues) -> Result<(i64, i64), String> {
    let entered = number(record, fields::ENTERED_TODAY, Some(fields::ENTERED_TOTAL))?;
    let exited = number(record, fields::EXITED_TODAY, Some(fields::EXITED_TOTAL))?;
    Ok((entered, exited))
}

/// Read `primary`, falling back to `fallback`; empty values count as absent.
fn lookup<'a>(record: &'a KeyValues, primary: &str, fallback: Option<&str>) -> Option<&'a str> {
    let get = |key: &str| {
        record
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    };
    get(primary).or_else(|| fallback.and_then(get))
}

/// Counters are non-negative and fit `u32`; anything else is malformed.
fn number(record: &KeyValues, primary: &str, fallback: Option<&str>) -> Result<i64, String> {
    let raw = lookup(record, primary, fallback).ok_or_else(|| format!("missing {primary}"))?;
    raw.parse::<u32>()
        .map(i64::from)
        .map_err(|_| format!("{primary} is not a counter: {raw:?}"))
}
