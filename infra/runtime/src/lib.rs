//! # Runtime
//!
//! Tokio runtime profiles for the hub workspace, plus the process-global runtime that
//! executes asynchronously delivered events when the caller is not already inside one.
//!
//! ## Profiles
//! * **Default**: worker threads detected from `TOKIO_WORKER_THREADS` or the CPU count.
//! * **High Performance**: larger stacks and a longer keep-alive for long-running services.
//! * **Memory Efficient**: half the workers and smaller stacks for tools and tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[hub_runtime::main(memory_efficient)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use hub_derive::main;

use anyhow::anyhow;
use serde::Deserialize;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

const DEFAULT_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
/// 3 `MiB`.
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
const DEFAULT_THREAD_NAME: &str = "hub-worker";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();
static GLOBAL_RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn detected_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| (1..=MAX_WORKER_THREADS).contains(&n))
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

/// Configuration for a multi-threaded Tokio runtime.
///
/// Deserializable so it can sit in the `[runtime]` table of the hub configuration; every
/// field is optional there and out-of-range values are clamped when the runtime is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub keep_alive_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl RuntimeConfig {
    /// Preset for long-running services with heavy async fan-out.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            stack_size: 4 * 1024 * 1024,
            thread_name: "hub-hp".to_owned(),
            keep_alive_secs: 300,
            ..Self::default()
        }
    }

    /// Preset for tools and tests where memory footprint matters.
    #[must_use]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (detected_worker_threads() / 2).max(1),
            stack_size: 2 * 1024 * 1024,
            thread_name: "hub-mem".to_owned(),
            keep_alive_secs: 30,
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive_secs = keep_alive.as_secs();
        self
    }

    /// Returns a copy with every field clamped to a safe range.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let thread_name = if self.thread_name.trim().is_empty() {
            DEFAULT_THREAD_NAME.to_owned()
        } else {
            self.thread_name.clone()
        };

        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKER_THREADS),
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name,
            keep_alive_secs: self.keep_alive_secs.max(1),
        }
    }
}

/// Builds a multi-threaded runtime from `config` (normalized first).
///
/// # Errors
///
/// Returns an error if Tokio cannot create the runtime, typically because the OS refused
/// to spawn worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(Duration::from_secs(config.keep_alive_secs))
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

/// Lazily built runtime shared by the whole process.
///
/// Used by asynchronous event delivery when the triggering thread is not running inside
/// a Tokio runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created. This is considered a fatal system error.
pub fn global_runtime() -> &'static Runtime {
    GLOBAL_RUNTIME.get_or_init(|| {
        let config = RuntimeConfig::memory_efficient().with_thread_name("hub-global");
        info!(threads = config.worker_threads, "Initializing global hub runtime");
        build_runtime_with_config(&config)
            .expect("CRITICAL: Failed to initialize the global hub runtime")
    })
}

/// Handle of the runtime the caller is running on, or of [`global_runtime`] otherwise.
#[must_use]
pub fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| global_runtime().handle().clone())
}
