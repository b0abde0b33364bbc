//! Facade crate for `PubSubHub`.
//! Re-exports the event hub, logging and runtime crates and wires a hub from configuration.
//! Keep this crate thin: it composes the infrastructure crates, it does not implement them.
//!
//! ## Usage
//! - Build a [`ListenerDirectory`] with the listeners your process owns.
//! - Load a [`HubConfig`] with [`load_config`].
//! - Call [`init`] to get an [`EventHub`] with the configured `[events]` registered.

pub mod config;

pub use crate::config::{ConfigError, ConfigErrorExt, HubConfig, load_config};
pub use hub_events as events;
pub use hub_events::{
    Args, AsyncDispatcher, BindingSpec, Delivery, ErrorHandler, EventHub, EventName, HandlerName,
    Handlers, HubError, InlineDispatcher, InvocationError, Listener, ListenerDirectory,
    ListenerRef, LogErrorHandler, TokioDispatcher, TriggerReport, args,
};
pub use hub_logger as logger;
pub use hub_runtime as runtime;

use tracing::info;

/// Replaces the registry of `hub` with the `[events]` table of `config`.
///
/// # Errors
/// Returns [`HubError::Validation`] if an entry has no listener or names one that is not in
/// `directory`; `hub` is left untouched in that case.
pub fn wire(hub: &EventHub, config: &HubConfig, directory: &ListenerDirectory) -> Result<(), HubError> {
    config.events.register(hub, directory)?;
    info!(events = hub.events().len(), listeners = directory.len(), "Event hub wired");
    Ok(())
}

/// Creates a hub with the default strategies and wires it from `config`.
///
/// # Errors
/// See [`wire`].
pub fn init(config: &HubConfig, directory: &ListenerDirectory) -> Result<EventHub, HubError> {
    let hub = EventHub::new();
    wire(&hub, config, directory)?;
    Ok(hub)
}
