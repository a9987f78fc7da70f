//! Clap derive structures for the `headcount` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// headcount -- occupancy from people-counting cameras
#[derive(Debug, Parser)]
#[command(
    name = "headcount",
    version,
    about = "Track live room occupancy from people-counting cameras",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "HEADCOUNT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Settings override store (defaults to overrides.toml next to the config)
    #[arg(long, env = "HEADCOUNT_OVERRIDES", global = true)]
    pub overrides: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(headcount_config::config_path)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.overrides
            .clone()
            .unwrap_or_else(|| headcount_config::overrides_path_for(&self.config_path()))
    }
}

// ── Output & Log Enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream every camera and keep the occupancy count until Ctrl-C
    Run(RunArgs),

    /// Poll every camera once and print its counters
    Summary,

    /// Inspect configuration and edit the override store
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Append events and audit rows to this JSON-lines file
    #[arg(long)]
    pub sink: Option<PathBuf>,

    /// Seconds to wait for tasks to stop after Ctrl-C
    #[arg(long, default_value = "10")]
    pub grace_secs: u64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets masked)
    Show,

    /// Print the config and override file locations
    Path,

    /// Persist one camera setting in the override store
    SetOverride {
        /// Camera name as configured
        camera: String,
        /// host, port, username or password
        field: String,
        /// New value; an empty string clears the override
        value: String,
    },

    /// Persist the rule area in the override store
    SetRuleArea {
        /// Rule area name; an empty string clears the override
        name: String,
    },

    /// Store a camera password in the system keyring
    SetPassword {
        camera: String,
        /// Password (read from HEADCOUNT_NEW_PASSWORD when omitted)
        #[arg(env = "HEADCOUNT_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}
