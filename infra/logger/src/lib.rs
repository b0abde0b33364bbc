//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for hub processes.
//!
//! * Compact ANSI console output.
//! * Optional rolling file output (plain text or JSON lines) behind a non-blocking writer.
//! * `EnvFilter` based filtering: a default level, optional directives, and `RUST_LOG`
//!   overrides on top.
//!
//! Processes usually drive it from the `[logging]` configuration section with
//! [`Logger::from_settings`]; the typed [`LoggerBuilder`] is there for code that wires
//! logging by hand.
//!
//! ## Example
//!
//! ```rust
//! # use hub_logger::{LevelFilter, Logger};
//! let _logger = Logger::builder()
//!     .name("pubsubhub")
//!     .level(LevelFilter::DEBUG)
//!     .filter("hub_events=trace")
//!     .init()
//!     .unwrap();
//!
//! tracing::debug!("subscriber installed");
//! ```

mod error;
mod settings;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::settings::{LogSettings, RotationPolicy};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use crate::settings::DEFAULT_MAX_FILES;
use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    filter: Option<String>,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            directory: None,
            level: LevelFilter::INFO,
            filter: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Configures and installs the global subscriber.
///
/// A name is required before [`LoggerBuilder::init`] is available; file-only options
/// appear once a directory is set.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Names the process; also the prefix of rolled files (`<name>.<date>.log`).
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { config: self.config, name: WithName(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Writes JSON lines to the log file.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.config.json = enabled;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    /// Default level for targets without a more specific directive.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds filter directives (e.g. `hub_events=trace`).
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail; `RUST_LOG` is ignored when
    /// directives are given.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        self.config.filter = Some(directives.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Enables rolling file output into `directory`, created if missing.
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.directory = Some(directory.into());
        LoggerBuilder { config, name: self.name, file: PhantomData }
    }

    /// Installs the subscriber.
    ///
    /// Keep the returned [`Logger`] alive for the lifetime of the process: it owns the
    /// file writer's worker guard.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber is already set,
    /// [`LoggerError::InvalidConfiguration`] for unusable settings and
    /// [`LoggerError::Io`] / [`LoggerError::Appender`] if file output cannot be prepared.
    pub fn init(self) -> Result<Logger, LoggerError> {
        validate_config(&self.config, &self.name.0)?;
        let env_filter = build_env_filter(&self.config)?;

        let mut layers = Vec::new();
        if self.config.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match &self.config.directory {
            Some(directory) => {
                fs::create_dir_all(directory)
                    .context(format!("Failed to create {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.config.rotation.clone())
                    .filename_prefix(&self.name.0)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.config.max_files)
                    .build(directory)?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if self.config.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable the console or set a directory.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name = %self.name.0, file = guard.is_some(), "Logger initialized");

        Ok(Logger { guard })
    }
}

/// Handle to the installed subscriber.
///
/// Dropping it flushes and stops the background file writer.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName, file: PhantomData }
    }

    /// Installs the subscriber described by a `[logging]` section.
    ///
    /// # Errors
    /// See [`LoggerBuilder::init`]; an unknown level name is reported as
    /// [`LoggerError::InvalidConfiguration`].
    pub fn from_settings(name: &str, settings: &LogSettings) -> Result<Self, LoggerError> {
        let mut builder = Self::builder()
            .name(name)
            .level(settings.level_filter()?)
            .console(settings.console);
        if let Some(filter) = &settings.filter {
            builder = builder.filter(filter.clone());
        }

        match &settings.directory {
            Some(directory) => builder
                .directory(directory)
                .rotation(settings.rotation.into())
                .max_files(settings.max_files)
                .json(settings.json)
                .init(),
            None => builder.init(),
        }
    }

    /// Whether log records are also written to files.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if config.directory.is_some() && config.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match &config.filter {
        Some(directives) => builder.parse(directives).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Invalid filter '{directives}': {e}").into(),
                context: None,
            }
        }),
        None => Ok(builder.from_env_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_builder_initial_state() {
        let builder = Logger::builder().name("hub").filter("hub_events=debug");
        assert!(builder.config.console);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert_eq!(builder.config.filter.as_deref(), Some("hub_events=debug"));
        assert!(builder.config.directory.is_none());
    }

    #[test]
    fn test_file_options_apply() {
        let builder = Logger::builder()
            .name("hub")
            .directory("logs")
            .max_files(3)
            .rotation(Rotation::HOURLY)
            .json(true);
        assert_eq!(builder.config.max_files, 3);
        assert_eq!(builder.config.rotation, Rotation::HOURLY);
        assert!(builder.config.json);
    }

    #[test]
    #[serial]
    fn test_invalid_settings_fail_before_install() {
        let err = Logger::builder().name(" ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = Logger::builder().name("hub").console(false).init().unwrap_err();
        assert!(err.to_string().contains("No logging output enabled"), "{err}");

        let err = Logger::builder().name("hub").filter("hub_events=notalevel").init().unwrap_err();
        assert!(err.to_string().contains("Invalid filter"), "{err}");

        let tmp = tempdir().unwrap();
        let err = Logger::builder().name("hub").directory(tmp.path()).max_files(0).init().unwrap_err();
        assert!(err.to_string().contains("max_files"), "{err}");
    }

    #[test]
    #[serial]
    fn test_from_settings_rejects_unknown_level() {
        let settings = LogSettings { level: "chatty".into(), ..LogSettings::default() };
        let err = Logger::from_settings("hub", &settings).unwrap_err();
        assert!(err.to_string().contains("unknown log level 'chatty'"), "{err}");
    }
}
