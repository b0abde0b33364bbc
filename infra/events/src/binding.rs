use crate::args::Args;
use crate::error::HubError;
use crate::invocation::InvocationError;
use crate::listener::{ErasedHandler, ListenerRef};
use crate::name::{EventName, HandlerName};
use serde::Deserialize;
use std::fmt;

/// How a binding's handler is run when its event is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Inline, on the triggering thread.
    #[default]
    Sync,
    /// Handed to the hub's async dispatcher.
    Async,
}

/// Binding descriptor supplied to `EventHub::register`.
///
/// The listener is optional here so that descriptors assembled from external input can be
/// rejected by the hub's validation instead of at construction time.
#[derive(Debug, Clone, Default)]
pub struct BindingSpec {
    listener: Option<ListenerRef>,
    handler: Option<HandlerName>,
    delivery: Delivery,
}

impl BindingSpec {
    /// Synchronous binding to `listener` using the default handler name.
    #[must_use]
    pub fn new(listener: impl Into<ListenerRef>) -> Self {
        Self { listener: Some(listener.into()), ..Self::default() }
    }

    #[must_use]
    pub fn maybe_listener(mut self, listener: Option<ListenerRef>) -> Self {
        self.listener = listener;
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: impl Into<HandlerName>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    #[must_use]
    pub const fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Shorthand for `.delivery(Delivery::Async)`.
    #[must_use]
    pub const fn asynchronous(self) -> Self {
        self.delivery(Delivery::Async)
    }

    pub(crate) fn validate(self, event: &EventName, index: usize) -> Result<Binding, HubError> {
        let Some(listener) = self.listener else {
            return Err(HubError::Validation {
                message: format!("binding #{index} of event `{event}` has no listener").into(),
                context: None,
            });
        };

        let handler = self.handler.unwrap_or_else(|| HandlerName::for_event(event));
        let target = listener.resolve(handler.as_str());
        Ok(Binding { listener, handler, delivery: self.delivery, target })
    }
}

/// A validated binding as stored in the registry.
///
/// The handler is resolved against the listener's table at registration; a name the
/// listener does not declare is kept and reported on every trigger instead.
#[derive(Clone)]
pub struct Binding {
    listener: ListenerRef,
    handler: HandlerName,
    delivery: Delivery,
    target: Option<ErasedHandler>,
}

impl Binding {
    #[must_use]
    pub const fn listener(&self) -> &ListenerRef {
        &self.listener
    }

    #[must_use]
    pub const fn handler(&self) -> &HandlerName {
        &self.handler
    }

    #[must_use]
    pub const fn delivery(&self) -> Delivery {
        self.delivery
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.delivery == Delivery::Async
    }

    /// Runs the handler inline.
    pub(crate) fn invoke(&self, args: &Args) -> Result<(), InvocationError> {
        match &self.target {
            Some(target) => self.listener.call(target, args),
            None => Err(self.listener.unknown_handler(&self.handler)),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("listener", &self.listener.name())
            .field("handler", &self.handler)
            .field("delivery", &self.delivery)
            .field("resolved", &self.target.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{Handlers, Listener};
    use std::sync::Arc;

    struct Greeter;

    impl Listener for Greeter {
        fn handlers(handlers: &mut Handlers<Self>) {
            handlers.on("handle_greet", |_greeter, _args| Ok(()));
        }
    }

    #[test]
    fn validation_fills_default_handler_and_resolves_it() {
        let binding = BindingSpec::new(Arc::new(Greeter)).validate(&"greet".into(), 0).unwrap();
        assert_eq!(binding.handler(), "handle_greet");
        assert_eq!(binding.delivery(), Delivery::Sync);
        assert!(binding.target.is_some());
        assert!(binding.invoke(&Args::new()).is_ok());
    }

    #[test]
    fn validation_keeps_unresolved_handlers() {
        let binding = BindingSpec::new(Arc::new(Greeter))
            .handler("wave")
            .asynchronous()
            .validate(&"greet".into(), 0)
            .unwrap();
        assert!(binding.is_async());
        assert!(binding.target.is_none());
        assert!(matches!(binding.invoke(&Args::new()), Err(InvocationError::UnknownHandler { .. })));
    }

    #[test]
    fn validation_rejects_missing_listener() {
        let err = BindingSpec::default().handler("wave").validate(&"greet".into(), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid registration: binding #2 of event `greet` has no listener"
        );
    }
}
