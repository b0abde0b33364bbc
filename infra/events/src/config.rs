use crate::binding::{BindingSpec, Delivery};
use crate::error::HubError;
use crate::hub::EventHub;
use crate::listener::ListenerDirectory;
use crate::name::EventName;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One binding entry of the `[events]` table.
///
/// ```toml
/// user_created = [{ listener = "audit", handler = "record", async = true }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    pub listener: Option<String>,
    pub handler: Option<String>,
    #[serde(rename = "async")]
    pub is_async: bool,
}

impl BindingConfig {
    /// Builds a descriptor, looking the listener up by name.
    ///
    /// An absent or unknown listener name yields a descriptor without a listener, which
    /// registration then rejects.
    #[must_use]
    pub fn resolve(&self, directory: &ListenerDirectory) -> BindingSpec {
        let listener = self.listener.as_deref().and_then(|name| {
            let found = directory.get(name).cloned();
            if found.is_none() {
                warn!(listener = name, "Unknown listener in event configuration");
            }
            found
        });

        let mut spec = BindingSpec::default().maybe_listener(listener);
        if let Some(handler) = &self.handler {
            spec = spec.handler(handler.clone());
        }
        if self.is_async {
            spec = spec.delivery(Delivery::Async);
        }
        spec
    }
}

/// The `[events]` table: event name to its ordered binding entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EventsConfig {
    pub events: BTreeMap<String, Vec<BindingConfig>>,
}

impl EventsConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Resolves every entry into descriptors ready for [`EventHub::register`].
    #[must_use]
    pub fn resolve(&self, directory: &ListenerDirectory) -> Vec<(EventName, Vec<BindingSpec>)> {
        self.events
            .iter()
            .map(|(event, bindings)| {
                let specs = bindings.iter().map(|binding| binding.resolve(directory)).collect();
                (EventName::from(event.clone()), specs)
            })
            .collect()
    }

    /// Replaces the registry of `hub` with the configured events in one all-or-nothing call.
    ///
    /// # Errors
    /// Returns [`HubError::Validation`] if an entry names no listener or one missing from
    /// `directory`.
    pub fn register(&self, hub: &EventHub, directory: &ListenerDirectory) -> Result<(), HubError> {
        hub.register(self.resolve(directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{Handlers, Listener};
    use std::sync::Arc;

    struct Audit;

    impl Listener for Audit {
        fn handlers(handlers: &mut Handlers<Self>) {
            handlers.on("record", |_audit, _args| Ok(()));
        }
    }

    fn directory() -> ListenerDirectory {
        ListenerDirectory::new().with("audit", Arc::new(Audit))
    }

    #[test]
    fn parses_async_key_and_ignores_unknown_keys() {
        let config: EventsConfig = serde_json::from_str(
            r#"{
                "user_created": [
                    { "listener": "audit" },
                    { "listener": "audit", "handler": "record", "async": true, "retries": 3 }
                ]
            }"#,
        )
        .unwrap();

        let bindings = &config.events["user_created"];
        assert_eq!(bindings[0], BindingConfig { listener: Some("audit".into()), ..Default::default() });
        assert!(bindings[1].is_async);
        assert_eq!(bindings[1].handler.as_deref(), Some("record"));
    }

    #[test]
    fn registers_resolved_bindings() {
        let config: EventsConfig = serde_json::from_str(
            r#"{ "user_created": [{ "listener": "audit", "handler": "record", "async": true }] }"#,
        )
        .unwrap();
        let hub = EventHub::new();
        config.register(&hub, &directory()).unwrap();

        let bindings = hub.bindings("user_created");
        assert_eq!(bindings.len(), 1);
        assert!(bindings[0].is_async());
        assert_eq!(bindings[0].handler(), "record");
    }

    #[test]
    fn misspelled_listener_key_fails_validation() {
        let config: EventsConfig =
            serde_json::from_str(r#"{ "some_event": [{ "listner_typo": "audit" }] }"#).unwrap();
        let hub = EventHub::new();

        let err = config.register(&hub, &directory()).unwrap_err();
        assert!(matches!(err, HubError::Validation { .. }));
        assert!(!hub.is_registered("some_event"));
    }

    #[test]
    fn unknown_listener_name_fails_validation() {
        let config: EventsConfig =
            serde_json::from_str(r#"{ "some_event": [{ "listener": "mailer" }] }"#).unwrap();
        assert!(config.register(&EventHub::new(), &directory()).is_err());
    }
}
