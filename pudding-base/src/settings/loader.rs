use std::collections::HashMap;
use std::env;
use std::error::Error;

use config::{Config, Environment, File};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

/// Environment variable listing extra config files, comma separated.
pub const CONFIG_FILES_VAR: &str = "CONFIG_FILES";

/// Load a settings object from the files named in `CONFIG_FILES`, then
/// from environment variables starting with `prefix`.
pub(crate) fn load_settings_object<T: DeserializeOwned>(prefix: &str) -> Result<T> {
    let config_file_paths: Vec<String> = env::var(CONFIG_FILES_VAR)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    load_settings_from(&config_file_paths, prefix, None)
}

/// Load a settings object from `paths` in order, later files overriding
/// earlier ones, then from prefixed environment variables. `env_vars`
/// replaces the process environment when given.
pub(crate) fn load_settings_from<T: DeserializeOwned>(
    paths: &[String],
    prefix: &str,
    env_vars: Option<HashMap<String, String>>,
) -> Result<T> {
    let builder = paths.iter().fold(Config::builder(), |builder, path| {
        builder.add_source(File::with_name(path))
    });

    let config_deserializer = builder
        .add_source(
            Environment::with_prefix(prefix)
                .separator("_")
                .try_parsing(true)
                .source(env_vars),
        )
        .build()?;

    let formatted_config = format!("{:#?}", config_deserializer);

    match config_deserializer.try_deserialize::<T>() {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            let mut err = if let Some(source_err) = err.source() {
                let source = format!("Config error source: {source_err}");
                Err(err).context(source)
            } else {
                Err(err.into())
            };

            for cfg_path in paths {
                err = err.with_context(|| format!("Config loaded: {cfg_path}"));
            }

            tracing::debug!(config = %formatted_config, "Error during deserialization");
            err.context("Config deserialization error")
        }
    }
}
