use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;
use std::path::Path;

use super::TaskpoolConfig;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "TASKPOOL_";

/// Repository config file stem looked up in the working directory
const REPO_CONFIG: &str = "taskpool";

impl TaskpoolConfig {
    /// Load the layered configuration and validate it.
    ///
    /// Priority, lowest first: embedded defaults, `taskpool.{toml,json,yaml}`,
    /// `custom_config`, `TASKPOOL_*` environment, `cli_overrides`.
    pub fn load<T: Serialize>(custom_config: Option<&Path>, cli_overrides: Option<T>) -> Result<Self> {
        let figment = Self::figment(custom_config, cli_overrides, ENV_PREFIX)?;
        let config: TaskpoolConfig = figment
            .extract()
            .context("Failed to parse configuration")?;
        config.validate()?;
        tracing::trace!("CONFIG LOAD: {config:?}");
        Ok(config)
    }

    /// Defaults only, ignoring files and environment
    pub fn embedded_defaults() -> Result<Self> {
        Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .extract()
            .context("Failed to parse embedded default configuration")
    }

    pub(crate) fn figment<T: Serialize>(
        custom_config: Option<&Path>,
        cli_overrides: Option<T>,
        env_prefix: &str,
    ) -> Result<Figment> {
        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(format!("{REPO_CONFIG}.toml")))
            .merge(Json::file(format!("{REPO_CONFIG}.json")))
            .merge(Yaml::file(format!("{REPO_CONFIG}.yaml")))
            .merge(Yaml::file(format!("{REPO_CONFIG}.yml")));

        if let Some(path) = custom_config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            tracing::debug!("Using config file {}", path.display());
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        // Environment variables override files
        figment = figment.merge(Env::prefixed(env_prefix).split("__"));

        // CLI (highest priority)
        if let Some(overrides) = cli_overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(figment)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
