//! Config subcommand handlers.

use std::path::PathBuf;

use headcount_config::{Config, Overrides};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ConfigPaths {
    config: PathBuf,
    overrides: PathBuf,
}

#[derive(Serialize)]
struct ConfigView {
    paths: ConfigPaths,
    config: Config,
    overrides: Overrides,
}

fn render_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("# unrenderable: {e}"))
}

fn require_camera(config: &Config, name: &str) -> Result<(), CliError> {
    if config.camera(name).is_some() {
        return Ok(());
    }
    Err(CliError::UnknownCamera {
        name: name.to_owned(),
        available: config
            .cameras
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let paths = ConfigPaths {
        config: global.config_path(),
        overrides: global.overrides_path(),
    };

    match args.command {
        ConfigCommand::Path => {
            let rendered = output::render_single(global.output, &paths, |p| {
                format!("{}\n{}", p.config.display(), p.overrides.display())
            })?;
            output::print_output(&rendered, global.quiet);
        }

        ConfigCommand::Show => {
            let (config, overrides) = super::load(global)?;
            let view = ConfigView {
                paths,
                config: config.masked(),
                overrides: overrides.masked(),
            };
            let rendered = output::render_single(global.output, &view, |v| {
                format!(
                    "# {}\n{}\n# {}\n{}",
                    v.paths.config.display(),
                    render_toml(&v.config),
                    v.paths.overrides.display(),
                    render_toml(&v.overrides),
                )
            })?;
            output::print_output(&rendered, global.quiet);
        }

        ConfigCommand::SetOverride {
            camera,
            field,
            value,
        } => {
            let (config, mut overrides) = super::load(global)?;
            require_camera(&config, &camera)?;
            overrides.set(&camera, &field, &value)?;
            headcount_config::save_overrides(&paths.overrides, &overrides)?;
            tracing::info!(camera = %camera, field = %field, "override saved");
            note(
                global,
                &format!("{camera}.{field} saved to {}", paths.overrides.display()),
            );
        }

        ConfigCommand::SetRuleArea { name } => {
            let mut overrides = headcount_config::load_overrides(&paths.overrides)?;
            overrides.rule_area_name = Some(name.clone()).filter(|n| !n.is_empty());
            headcount_config::save_overrides(&paths.overrides, &overrides)?;
            note(
                global,
                &format!("rule area saved to {}", paths.overrides.display()),
            );
        }

        ConfigCommand::SetPassword { camera, password } => {
            let (config, _) = super::load(global)?;
            require_camera(&config, &camera)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "must not be empty".into(),
                });
            }
            headcount_config::store_password(&camera, &password)?;
            note(global, &format!("password for {camera} stored in system keyring"));
        }
    }
    Ok(())
}
