// Counter reconciliation state machine
//
// Plain, synchronous state: no tokio, no I/O. The engine task owns the
// only instance and serializes every call, so nothing here locks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::DeviceSource;
use crate::model::{
    CameraOccupancy, ChannelDebug, Direction, OccupancySnapshot, PeopleEvent, ResetLog,
};

/// Reason recorded by the daily reset.
pub const SCHEDULED_RESET: &str = "SCHEDULED_RESET";

/// Latest raw readings for one logical channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub last_entered: i64,
    pub last_exited: i64,
    pub inside_total: i64,
}

#[derive(Debug)]
struct Camera {
    name: String,
    logical_channel: u32,
    flow_weight: i64,
    gauge_weight: i64,
    state: ChannelState,
}

impl Camera {
    fn occupancy(&self) -> i64 {
        let flow = self.state.last_entered.saturating_sub(self.state.last_exited);
        self.flow_weight
            .saturating_mul(flow)
            .saturating_add(self.gauge_weight.saturating_mul(self.state.inside_total))
    }
}

/// Occupancy state for every configured camera plus the manual offset.
#[derive(Debug)]
pub struct Reconciler {
    /// Configuration order; index 0 is the reference camera.
    cameras: Vec<Camera>,
    by_channel: HashMap<u32, usize>,
    offset: i64,
    last_correction: Option<DateTime<Utc>>,
}

impl Reconciler {
    /// Register one channel per camera, all readings at zero.
    ///
    /// A logical channel claimed by two cameras stays with the first.
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a DeviceSource>) -> Self {
        let mut cameras = Vec::new();
        let mut by_channel = HashMap::new();

        for device in devices {
            if by_channel.contains_key(&device.logical_channel) {
                tracing::warn!(
                    device = %device.name,
                    channel = device.logical_channel,
                    "logical channel already registered, camera ignored"
                );
                continue;
            }
            by_channel.insert(device.logical_channel, cameras.len());
            cameras.push(Camera {
                name: device.name.clone(),
                logical_channel: device.logical_channel,
                flow_weight: device.flow_weight,
                gauge_weight: device.gauge_weight,
                state: ChannelState::default(),
            });
        }

        Self {
            cameras,
            by_channel,
            offset: 0,
            last_correction: None,
        }
    }

    /// Whether `channel` belongs to a configured camera.
    pub fn knows(&self, channel: u32) -> bool {
        self.by_channel.contains_key(&channel)
    }

    /// Current state of `channel`, if configured.
    pub fn channel(&self, channel: u32) -> Option<ChannelState> {
        self.by_channel.get(&channel).map(|&i| self.cameras[i].state)
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Fold a cumulative counter reading into the state.
    ///
    /// Deltas are clamped at zero so a device counter that restarts never
    /// reads as negative flow. The stored counters always take the new
    /// values. Returns one event per direction that moved; an unknown
    /// channel returns nothing.
    pub fn apply_counters(
        &mut self,
        channel: u32,
        entered: i64,
        exited: i64,
        at: DateTime<Utc>,
    ) -> Vec<PeopleEvent> {
        let Some(&index) = self.by_channel.get(&channel) else {
            return Vec::new();
        };

        let camera = &mut self.cameras[index];
        let delta_in = entered.saturating_sub(camera.state.last_entered).max(0);
        let delta_out = exited.saturating_sub(camera.state.last_exited).max(0);
        camera.state.last_entered = entered;
        camera.state.last_exited = exited;

        if delta_in == 0 && delta_out == 0 {
            return Vec::new();
        }

        let occupancy = self.total();
        let camera = &self.cameras[index];
        [(Direction::Entry, delta_in), (Direction::Exit, delta_out)]
            .into_iter()
            .filter(|&(_, delta)| delta > 0)
            .map(|(direction, delta)| PeopleEvent {
                id: Uuid::new_v4(),
                timestamp: at,
                camera: camera.name.clone(),
                logical_channel: channel,
                direction,
                delta,
                entered_total: entered,
                exited_total: exited,
                occupancy,
            })
            .collect()
    }

    /// Store the latest inside gauge, clamped at zero.
    ///
    /// Returns `false` for an unknown channel.
    pub fn apply_gauge(&mut self, channel: u32, inside: i64) -> bool {
        let Some(&index) = self.by_channel.get(&channel) else {
            return false;
        };
        self.cameras[index].state.inside_total = inside.max(0);
        true
    }

    /// Shift the offset so the total becomes `target`.
    ///
    /// Returns the audit row, or `None` when the total already equals
    /// `target`.
    pub fn manual_set(&mut self, target: i64, reason: &str, at: DateTime<Utc>) -> Option<ResetLog> {
        let current = self.total();
        if current == target {
            return None;
        }

        let offset_before = self.offset;
        self.offset = self.offset.saturating_add(target.saturating_sub(current));
        self.last_correction = Some(at);

        Some(ResetLog {
            timestamp: at,
            camera: self.cameras.first().map(|c| c.name.clone()),
            reason: format!("{reason}: {target}"),
            success: true,
            error: None,
            offset_before,
            offset_after: self.offset,
        })
    }

    /// Bring the total back to zero.
    pub fn reset(&mut self, reason: &str, at: DateTime<Utc>) -> Option<ResetLog> {
        self.manual_set(0, reason, at)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Σ per camera `(flow·(entered − exited) + gauge·inside)` + offset.
    pub fn total(&self) -> i64 {
        self.cameras
            .iter()
            .map(Camera::occupancy)
            .fold(self.offset, i64::saturating_add)
    }

    /// Full snapshot; the offset is attributed to the reference camera.
    pub fn snapshot(&self, at: DateTime<Utc>) -> OccupancySnapshot {
        let per_camera = self
            .cameras
            .iter()
            .enumerate()
            .map(|(i, camera)| CameraOccupancy {
                camera: camera.name.clone(),
                logical_channel: camera.logical_channel,
                occupancy: camera
                    .occupancy()
                    .saturating_add(if i == 0 { self.offset } else { 0 }),
            })
            .collect();

        OccupancySnapshot {
            timestamp: at,
            total: self.total(),
            per_camera,
            offset: self.offset,
            last_correction: self.last_correction,
        }
    }

    /// One row per channel, in configuration order.
    pub fn debug_state(&self) -> Vec<ChannelDebug> {
        self.cameras
            .iter()
            .map(|camera| ChannelDebug {
                logical_channel: camera.logical_channel,
                camera: camera.name.clone(),
                last_entered: camera.state.last_entered,
                last_exited: camera.state.last_exited,
                inside_total: camera.state.inside_total,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    fn device(name: &str, logical_channel: u32, gauge_weight: i64) -> DeviceSource {
        DeviceSource {
            name: name.into(),
            host: "127.0.0.1".into(),
            port: 80,
            username: "admin".into(),
            password: SecretString::from(String::new()),
            logical_channel,
            attach_channel: 1,
            flow_weight: 1,
            gauge_weight,
            rule_area: None,
        }
    }

    /// D4 on channel 3 (gauge counted), D6 on channel 5.
    fn reconciler() -> Reconciler {
        Reconciler::new(&[device("D4", 3, 1), device("D6", 5, 0)])
    }

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn entry_delta_from_consecutive_snapshots() {
        let mut r = reconciler();
        r.apply_counters(3, 10, 4, now());

        let events = r.apply_counters(3, 15, 4, now());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Entry);
        assert_eq!(events[0].delta, 5);
        assert_eq!(events[0].entered_total, 15);
        assert_eq!(events[0].occupancy, 11);
        assert_eq!(r.total(), 11);
    }

    #[test]
    fn both_directions_yield_two_events() {
        let mut r = reconciler();
        let events = r.apply_counters(5, 3, 2, now());

        let directions: Vec<_> = events.iter().map(|e| (e.direction, e.delta)).collect();
        assert_eq!(directions, vec![(Direction::Entry, 3), (Direction::Exit, 2)]);
        assert!(events.iter().all(|e| e.occupancy == 1 && e.camera == "D6"));
    }

    #[test]
    fn extreme_readings_saturate_instead_of_overflowing() {
        let mut r = reconciler();

        let events = r.apply_counters(3, i64::MAX, -1, now());
        assert_eq!(events.len(), 1);
        assert_eq!(r.total(), i64::MAX);

        r.apply_counters(5, i64::MAX, 0, now());
        assert_eq!(r.total(), i64::MAX);
        assert_eq!(r.snapshot(now()).total, i64::MAX);

        let log = r.manual_set(i64::MIN, "MANUAL", now()).unwrap();
        assert_eq!(log.offset_after, i64::MIN);
        assert!(r.reset("MANUAL", now()).is_some());
    }

    #[test]
    fn device_reboot_is_clamped() {
        let mut r = reconciler();
        r.apply_counters(3, 100, 0, now());

        let events = r.apply_counters(3, 3, 0, now());

        assert!(events.is_empty());
        assert_eq!(r.channel(3).map(|s| s.last_entered), Some(3));
    }

    #[test]
    fn counters_track_latest_snapshot() {
        let mut r = reconciler();
        for (e, x) in [(5, 1), (2, 9), (7, 3), (7, 3), (0, 0)] {
            r.apply_counters(3, e, x, now());
            let state = r.channel(3).unwrap();
            assert_eq!((state.last_entered, state.last_exited), (e, x));
        }
    }

    #[test]
    fn duplicate_snapshot_reconciles_once() {
        let mut r = reconciler();
        assert_eq!(r.apply_counters(3, 8, 2, now()).len(), 2);
        assert!(r.apply_counters(3, 8, 2, now()).is_empty());
    }

    #[test]
    fn unknown_channel_is_ignored() {
        let mut r = reconciler();
        assert!(r.apply_counters(99, 10, 0, now()).is_empty());
        assert!(!r.apply_gauge(99, 4));
        assert_eq!(r.total(), 0);
    }

    #[test]
    fn gauge_is_clamped_and_weighted() {
        let mut r = reconciler();
        assert!(r.apply_gauge(3, -4));
        assert_eq!(r.channel(3).map(|s| s.inside_total), Some(0));

        r.apply_gauge(3, 6);
        r.apply_gauge(5, 100);
        // D6 gauge weight is zero
        assert_eq!(r.total(), 6);
    }

    #[test]
    fn manual_set_to_current_is_noop() {
        let mut r = reconciler();
        r.apply_counters(3, 4, 1, now());

        assert_eq!(r.manual_set(3, "MANUAL", now()), None);
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn manual_set_then_snapshot_yields_target() {
        let mut r = reconciler();
        r.apply_counters(3, 10, 2, now());
        r.apply_gauge(3, 1);

        let log = r.manual_set(20, "MANUAL", now()).unwrap();

        assert_eq!(log.reason, "MANUAL: 20");
        assert_eq!(log.camera.as_deref(), Some("D4"));
        assert_eq!((log.offset_before, log.offset_after), (0, 11));
        assert_eq!(r.snapshot(now()).total, 20);
    }

    #[test]
    fn reset_writes_scheduled_audit_and_zeroes_total() {
        let mut r = reconciler();
        r.apply_counters(3, 12, 4, now());
        r.apply_counters(5, 6, 1, now());

        let log = r.reset(SCHEDULED_RESET, now()).unwrap();

        assert_eq!(log.reason, "SCHEDULED_RESET: 0");
        assert!(log.success);
        assert_eq!(r.total(), 0);
        assert_eq!(r.reset(SCHEDULED_RESET, now()), None);
    }

    #[test]
    fn per_camera_values_sum_to_total() {
        let mut r = reconciler();
        r.apply_counters(3, 10, 4, now());
        r.apply_counters(5, 7, 2, now());
        r.apply_gauge(3, 2);
        r.manual_set(4, "MANUAL", now());

        let snap = r.snapshot(now());
        let sum: i64 = snap.per_camera.iter().map(|c| c.occupancy).sum();

        assert_eq!(snap.total, 4);
        assert_eq!(sum, snap.total);
        assert_eq!(snap.per_camera[1].occupancy, 5);
        assert_eq!(snap.last_correction, Some(now()));
    }

    #[test]
    fn debug_state_lists_channels_in_order() {
        let mut r = reconciler();
        r.apply_counters(5, 2, 1, now());

        let rows = r.debug_state();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].camera, "D4");
        assert_eq!(
            rows[1],
            ChannelDebug {
                logical_channel: 5,
                camera: "D6".into(),
                last_entered: 2,
                last_exited: 1,
                inside_total: 0,
            }
        );
    }

    #[test]
    fn duplicate_logical_channel_keeps_first() {
        let r = Reconciler::new(&[device("A", 1, 1), device("B", 1, 0)]);
        assert_eq!(r.debug_state().len(), 1);
        assert_eq!(r.debug_state()[0].camera, "A");
    }
}
