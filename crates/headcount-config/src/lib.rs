//! Shared configuration for the headcount daemon and tools.
//!
//! TOML config, the persisted settings-override store, credential
//! resolution (env + keyring + plaintext), and translation to
//! `headcount_core::MonitorConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use headcount_api::TransportConfig;
use headcount_core::{DeviceSource, MonitorConfig, ResetSchedule};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEYRING_SERVICE: &str = "headcount";
const MASK: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for camera '{camera}'")]
    NoCredentials { camera: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Rule area passed to `getSummary` as `name=`.
    #[serde(default = "default_rule_area")]
    pub rule_area_name: String,

    /// Fallback poll interval; 0 disables the poller.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub backoff: BackoffSettings,

    #[serde(default)]
    pub reset: ResetSettings,

    #[serde(default)]
    pub sink: SinkSettings,

    #[serde(default = "default_cameras")]
    pub cameras: Vec<CameraConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_area_name: default_rule_area(),
            poll_interval_secs: default_poll_interval(),
            heartbeat_secs: default_heartbeat(),
            idle_timeout_secs: default_idle_timeout(),
            request_timeout_secs: default_request_timeout(),
            backoff: BackoffSettings::default(),
            reset: ResetSettings::default(),
            sink: SinkSettings::default(),
            cameras: default_cameras(),
        }
    }
}

fn default_rule_area() -> String {
    "PC-1".into()
}
fn default_poll_interval() -> u64 {
    60
}
fn default_heartbeat() -> u64 {
    5
}
fn default_idle_timeout() -> u64 {
    30
}
fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackoffSettings {
    #[serde(default = "default_backoff_initial")]
    pub initial_secs: u64,
    #[serde(default = "default_backoff_max")]
    pub max_secs: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_secs: default_backoff_initial(),
            max_secs: default_backoff_max(),
        }
    }
}

fn default_backoff_initial() -> u64 {
    1
}
fn default_backoff_max() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResetSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reset_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl Default for ResetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_reset_hour(),
            minute: 0,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_reset_hour() -> u32 {
    3
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SinkSettings {
    /// JSON-lines file for events and audit rows. Unset: log only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// One camera.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    pub name: String,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password, checked after the env var and keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Channel the engine keys this camera on.
    pub logical_channel: u32,

    /// Channel sent to the camera.
    #[serde(default = "default_attach_channel")]
    pub attach_channel: u32,

    /// Defaults to 1 for the first camera, 0 for the others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauge_weight: Option<i64>,

    #[serde(default = "default_flow_weight")]
    pub flow_weight: i64,
}

fn default_port() -> u16 {
    80
}
fn default_username() -> String {
    "admin".into()
}
fn default_attach_channel() -> u32 {
    1
}
fn default_flow_weight() -> i64 {
    1
}

fn default_cameras() -> Vec<CameraConfig> {
    let camera = |name: &str, host: &str, logical_channel| CameraConfig {
        name: name.into(),
        host: host.into(),
        port: default_port(),
        username: default_username(),
        password: None,
        password_env: Some(format!("HEADCOUNT_{name}_PASSWORD")),
        logical_channel,
        attach_channel: default_attach_channel(),
        gauge_weight: None,
        flow_weight: default_flow_weight(),
    };
    vec![
        camera("D4", "172.16.170.35", 3),
        camera("D6", "172.16.170.36", 5),
    ]
}

// ── Settings overrides ──────────────────────────────────────────────

/// Persisted settings that take precedence over the static config.
///
/// An empty string or a zero port counts as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_area_name: Option<String>,

    /// Keyed by camera name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cameras: BTreeMap<String, CameraOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CameraOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Override fields that can be set per camera.
pub const OVERRIDE_FIELDS: [&str; 4] = ["host", "port", "username", "password"];

impl Overrides {
    /// Set one camera field from its textual value. An empty value clears it.
    pub fn set(&mut self, camera: &str, field: &str, value: &str) -> Result<(), ConfigError> {
        let text = Some(value.to_owned()).filter(|v| !v.is_empty());
        let mut entry = self.cameras.get(camera).cloned().unwrap_or_default();
        match field {
            "host" => entry.host = text,
            "username" => entry.username = text,
            "password" => entry.password = text,
            "port" => {
                entry.port = text
                    .map(|v| {
                        v.parse().map_err(|_| {
                            invalid("port", format!("expected 0-65535, got '{v}'"))
                        })
                    })
                    .transpose()?;
            }
            other => {
                return Err(invalid(
                    "field",
                    format!("expected one of {}, got '{other}'", OVERRIDE_FIELDS.join(", ")),
                ));
            }
        }
        if entry == CameraOverride::default() {
            self.cameras.remove(camera);
        } else {
            self.cameras.insert(camera.to_owned(), entry);
        }
        Ok(())
    }

    /// Effective rule area: the override if non-empty, else `fallback`.
    pub fn rule_area<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty(self.rule_area_name.as_deref()).unwrap_or(fallback)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Config file paths ───────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "headcount", "headcount").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("headcount");
    p
}

/// The overrides file lives next to the config file.
pub fn overrides_path_for(config_path: &Path) -> PathBuf {
    config_path.with_file_name("overrides.toml")
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from `path` (or the platform default) + environment.
///
/// A missing default file yields the built-in defaults; an explicitly
/// named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => {
            if !p.exists() {
                return Err(invalid(
                    "config",
                    format!("file not found: {}", p.display()),
                ));
            }
            p.to_path_buf()
        }
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&file))
        .merge(Env::prefixed("HEADCOUNT_").split("__"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

/// Load the overrides store; a missing file is an empty store.
pub fn load_overrides(path: &Path) -> Result<Overrides, ConfigError> {
    if !path.exists() {
        return Ok(Overrides::default());
    }
    Ok(Figment::from(Toml::file(path)).extract()?)
}

/// Write the overrides store back to `path`.
pub fn save_overrides(path: &Path, overrides: &Overrides) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(overrides)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation ──────────────────────────────────────────────────────

impl Config {
    /// Check everything that would otherwise fail at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cameras.is_empty() {
            return Err(invalid("cameras", "at least one camera is required"));
        }

        let mut names = std::collections::HashSet::new();
        let mut channels = std::collections::HashSet::new();
        for camera in &self.cameras {
            if camera.name.trim().is_empty() {
                return Err(invalid("cameras.name", "must not be empty"));
            }
            if !names.insert(camera.name.as_str()) {
                return Err(invalid(
                    "cameras.name",
                    format!("duplicate camera '{}'", camera.name),
                ));
            }
            if !channels.insert(camera.logical_channel) {
                return Err(invalid(
                    "cameras.logical_channel",
                    format!(
                        "channel {} used by more than one camera",
                        camera.logical_channel
                    ),
                ));
            }
            if camera.host.trim().is_empty() {
                return Err(invalid(
                    "cameras.host",
                    format!("camera '{}' has no host", camera.name),
                ));
            }
        }

        if self.reset.hour > 23 || self.reset.minute > 59 {
            return Err(invalid(
                "reset",
                format!("{}:{:02} is not a time of day", self.reset.hour, self.reset.minute),
            ));
        }
        if self.backoff.initial_secs == 0 {
            return Err(invalid("backoff.initial_secs", "must be at least 1"));
        }
        if self.backoff.max_secs < self.backoff.initial_secs {
            return Err(invalid("backoff.max_secs", "must not be below initial_secs"));
        }
        if self.idle_timeout_secs <= self.heartbeat_secs {
            return Err(invalid(
                "idle_timeout_secs",
                "must be longer than heartbeat_secs",
            ));
        }
        Ok(())
    }

    /// A copy safe to print: every plaintext password replaced.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        for camera in &mut copy.cameras {
            if camera.password.is_some() {
                camera.password = Some(MASK.into());
            }
        }
        copy
    }

    pub fn camera(&self, name: &str) -> Option<&CameraConfig> {
        self.cameras.iter().find(|c| c.name == name)
    }
}

impl Overrides {
    /// A copy safe to print.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        for camera in copy.cameras.values_mut() {
            if camera.password.is_some() {
                camera.password = Some(MASK.into());
            }
        }
        copy
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a camera password: env var → system keyring → plaintext.
pub fn resolve_password(camera: &CameraConfig) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        camera,
        |name| std::env::var(name).ok(),
        |camera| {
            keyring::Entry::new(KEYRING_SERVICE, &format!("{camera}/password"))
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_with(
    camera: &CameraConfig,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Camera's password_env → env var lookup
    if let Some(pw) = camera.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. System keyring
    if let Some(pw) = keyring(&camera.name) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = camera.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        camera: camera.name.clone(),
    })
}

/// Store a camera password in the system keyring.
pub fn store_password(camera: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{camera}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| invalid("keyring", e.to_string()))
}

// ── Translation to core types ───────────────────────────────────────

/// Camera with overrides applied, before credentials are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveCamera {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Override password, if one is stored.
    pub password_override: Option<String>,
}

/// Apply the override store to one camera.
pub fn effective_camera(camera: &CameraConfig, overrides: &Overrides) -> EffectiveCamera {
    let o = overrides.cameras.get(&camera.name);
    let pick = |value: Option<&String>, fallback: &str| {
        non_empty(value.map(String::as_str))
            .unwrap_or(fallback)
            .to_owned()
    };

    EffectiveCamera {
        name: camera.name.clone(),
        host: pick(o.and_then(|o| o.host.as_ref()), &camera.host),
        port: o
            .and_then(|o| o.port)
            .filter(|&p| p != 0)
            .unwrap_or(camera.port),
        username: pick(o.and_then(|o| o.username.as_ref()), &camera.username),
        password_override: o
            .and_then(|o| non_empty(o.password.as_deref()))
            .map(str::to_owned),
    }
}

/// Build every `DeviceSource`, overrides applied and passwords resolved.
pub fn device_sources(
    config: &Config,
    overrides: &Overrides,
) -> Result<Vec<DeviceSource>, ConfigError> {
    let rule_area = overrides.rule_area(&config.rule_area_name).to_owned();

    config
        .cameras
        .iter()
        .enumerate()
        .map(|(i, camera)| {
            let effective = effective_camera(camera, overrides);
            let password = match effective.password_override {
                Some(pw) => SecretString::from(pw),
                None => resolve_password(camera)?,
            };
            Ok(DeviceSource {
                name: effective.name,
                host: effective.host,
                port: effective.port,
                username: effective.username,
                password,
                logical_channel: camera.logical_channel,
                attach_channel: camera.attach_channel,
                flow_weight: camera.flow_weight,
                gauge_weight: camera.gauge_weight.unwrap_or(i64::from(i == 0)),
                rule_area: Some(rule_area.clone()).filter(|a| !a.is_empty()),
            })
        })
        .collect()
}

/// Transport settings shared by every camera.
pub fn transport_config(config: &Config) -> TransportConfig {
    TransportConfig {
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        ..TransportConfig::default()
    }
}

/// Build the full `MonitorConfig`.
pub fn to_monitor_config(
    config: &Config,
    overrides: &Overrides,
) -> Result<MonitorConfig, ConfigError> {
    let reset = if config.reset.enabled {
        Some(
            ResetSchedule::daily(config.reset.hour, config.reset.minute)
                .ok_or_else(|| invalid("reset", "not a time of day"))?,
        )
    } else {
        None
    };

    Ok(MonitorConfig {
        devices: device_sources(config, overrides)?,
        transport: transport_config(config),
        heartbeat_secs: config.heartbeat_secs,
        poll_interval: Duration::from_secs(config.poll_interval_secs),
        backoff_floor: Duration::from_secs(config.backoff.initial_secs),
        backoff_ceiling: Duration::from_secs(config.backoff.max_secs),
        reset,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn camera(name: &str, channel: u32) -> CameraConfig {
        CameraConfig {
            name: name.into(),
            host: "10.0.0.5".into(),
            port: 80,
            username: "admin".into(),
            password: Some("plain".into()),
            password_env: None,
            logical_channel: channel,
            attach_channel: 1,
            gauge_weight: None,
            flow_weight: 1,
        }
    }

    #[test]
    fn defaults_describe_two_cameras() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.rule_area_name, "PC-1");
        assert_eq!(
            config
                .cameras
                .iter()
                .map(|c| (c.name.as_str(), c.logical_channel, c.attach_channel))
                .collect::<Vec<_>>(),
            vec![("D4", 3, 1), ("D6", 5, 1)]
        );
        assert_eq!((config.reset.hour, config.reset.minute), (3, 0));
    }

    #[test]
    fn file_replaces_cameras_and_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            r#"
            poll_interval_secs = 30

            [reset]
            hour = 4

            [[cameras]]
            name = "Lobby"
            host = "10.1.1.9"
            password = "pw"
            logical_channel = 7
            "#,
        );

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.heartbeat_secs, 5);
        assert_eq!((config.reset.hour, config.reset.minute), (4, 0));
        assert_eq!(config.cameras.len(), 1);
        assert_eq!(config.cameras[0].port, 80);
        assert_eq!(config.cameras[0].attach_channel, 1);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn duplicate_logical_channel_is_rejected() {
        let config = Config {
            cameras: vec![camera("A", 1), camera("B", 1)],
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "cameras.logical_channel"
        ));
    }

    #[test]
    fn overrides_ignore_empty_strings_and_zero_port() {
        let cam = camera("D4", 3);
        let mut overrides = Overrides::default();
        overrides.cameras.insert(
            "D4".into(),
            CameraOverride {
                host: Some(String::new()),
                port: Some(0),
                username: Some("operator".into()),
                password: Some("  ".into()),
            },
        );

        let effective = effective_camera(&cam, &overrides);

        assert_eq!(effective.host, "10.0.0.5");
        assert_eq!(effective.port, 80);
        assert_eq!(effective.username, "operator");
        assert_eq!(effective.password_override, None);
    }

    #[test]
    fn overrides_win_when_set() {
        let mut overrides = Overrides::default();
        overrides.set("D4", "host", "10.9.9.9").unwrap();
        overrides.set("D4", "port", "8080").unwrap();
        overrides.set("D4", "password", "fresh").unwrap();
        overrides.rule_area_name = Some("PC-2".into());

        let config = Config {
            cameras: vec![camera("D4", 3), camera("D6", 5)],
            ..Config::default()
        };
        let devices = device_sources(&config, &overrides).unwrap();

        assert_eq!((devices[0].host.as_str(), devices[0].port), ("10.9.9.9", 8080));
        assert_eq!(devices[0].password.expose_secret(), "fresh");
        assert_eq!(devices[0].rule_area.as_deref(), Some("PC-2"));
        assert_eq!(devices[1].host, "10.0.0.5");
    }

    #[test]
    fn set_rejects_unknown_field_and_bad_port() {
        let mut overrides = Overrides::default();
        assert!(overrides.set("D4", "colour", "red").is_err());
        assert!(overrides.set("D4", "port", "http").is_err());
    }

    #[test]
    fn empty_value_clears_override() {
        let mut overrides = Overrides::default();
        overrides.set("D4", "host", "10.9.9.9").unwrap();
        overrides.set("D4", "host", "").unwrap();
        assert_eq!(overrides, Overrides::default());
    }

    #[test]
    fn overrides_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("overrides.toml");
        assert_eq!(load_overrides(&path).unwrap(), Overrides::default());

        let mut overrides = Overrides::default();
        overrides.set("D6", "host", "172.16.170.99").unwrap();
        overrides.rule_area_name = Some("PC-3".into());
        save_overrides(&path, &overrides).unwrap();

        assert_eq!(load_overrides(&path).unwrap(), overrides);
    }

    #[test]
    fn password_chain_order() {
        let mut cam = camera("D4", 3);
        cam.password_env = Some("D4_PW".into());

        let from_env = resolve_password_with(&cam, |_| Some("env".into()), |_| Some("ring".into()));
        assert_eq!(from_env.unwrap().expose_secret(), "env");

        let from_ring = resolve_password_with(&cam, |_| None, |_| Some("ring".into()));
        assert_eq!(from_ring.unwrap().expose_secret(), "ring");

        let from_plain = resolve_password_with(&cam, |_| None, |_| None);
        assert_eq!(from_plain.unwrap().expose_secret(), "plain");

        cam.password = None;
        assert!(matches!(
            resolve_password_with(&cam, |_| None, |_| None),
            Err(ConfigError::NoCredentials { camera }) if camera == "D4"
        ));
    }

    #[test]
    fn monitor_config_weights_and_timings() {
        let config = Config {
            cameras: vec![camera("D4", 3), camera("D6", 5)],
            ..Config::default()
        };
        let monitor = to_monitor_config(&config, &Overrides::default()).unwrap();

        let weights: Vec<_> = monitor
            .devices
            .iter()
            .map(|d| (d.gauge_weight, d.flow_weight))
            .collect();
        assert_eq!(weights, vec![(1, 1), (0, 1)]);
        assert_eq!(monitor.backoff_ceiling, Duration::from_secs(60));
        assert_eq!(monitor.transport.idle_timeout, Duration::from_secs(30));
        assert!(monitor.reset.is_some());
    }

    #[test]
    fn masked_hides_passwords() {
        let config = Config {
            cameras: vec![camera("D4", 3)],
            ..Config::default()
        };
        assert_eq!(config.masked().cameras[0].password.as_deref(), Some(MASK));
    }
}
