use config::{Config, Environment, File};
use hub_events::EventsConfig;
use hub_logger::LogSettings;
use hub_runtime::RuntimeConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `PUBSUBHUB__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "PUBSUBHUB";
/// Base name looked up when no path is given; any supported extension works.
pub const DEFAULT_CONFIG_PATH: &str = "pubsubhub";

#[hub_derive::hub_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Complete configuration of a hub process.
///
/// ```toml
/// [logging]
/// level = "info"
///
/// [runtime]
/// worker_threads = 4
///
/// [events]
/// user_created = [
///   { listener = "mailer" },
///   { listener = "audit", handler = "record", async = true },
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub logging: LogSettings,
    pub runtime: RuntimeConfig,
    pub events: EventsConfig,
}

/// Loads `T` from a configuration file overlaid with `PUBSUBHUB__*` environment variables.
///
/// Nested keys are separated by a double underscore: `PUBSUBHUB__RUNTIME__WORKER_THREADS`
/// maps to `runtime.worker_threads`.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or unreadable, or if the merged
/// values do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use pubsubhub::config::{HubConfig, load_config};
///
/// let config: HubConfig = load_config(Some("config/local")).unwrap_or_default();
/// assert!(config.events.is_empty());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_with_environment(path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_environment<T>(
    path: Option<impl AsRef<Path>>,
    environment: Environment,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(environment.separator("__").convert_case(config::Case::Snake));

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context(format!("Failed to build config from {}", effective_path.display()))?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hub.toml");
        fs::write(&path, "[logging]\nlevel = \"warn\"\nmax_files = 3\n").unwrap();

        let config: HubConfig = load_with_environment(
            Some(&path),
            env(&[("PUBSUBHUB__LOGGING__LEVEL", "debug"), ("PUBSUBHUB__RUNTIME__THREAD_NAME", "env-worker")]),
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 3);
        assert_eq!(config.runtime.thread_name, "env-worker");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_with_environment::<HubConfig>(Some(dir.path().join("absent.toml")), env(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to build config"), "{err}");
    }
}
