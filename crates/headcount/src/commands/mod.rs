//! Command handlers.

pub mod config_cmd;
pub mod run;
pub mod summary;

use headcount_config::{Config, Overrides};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Static config plus the override store, both from the paths in `global`.
fn load(global: &GlobalOpts) -> Result<(Config, Overrides), CliError> {
    let config = headcount_config::load_config(global.config.as_deref())?;
    let overrides = headcount_config::load_overrides(&global.overrides_path())?;
    Ok((config, overrides))
}
