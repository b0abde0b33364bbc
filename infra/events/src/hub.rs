use crate::args::Args;
use crate::binding::{Binding, BindingSpec, Delivery};
use crate::error::HubError;
use crate::invocation::{InvocationError, InvocationErrorExt, catch_panic};
use crate::name::EventName;
use crate::strategy::{AsyncDispatcher, ErrorHandler, LogErrorHandler, TokioDispatcher};
use anyhow::anyhow;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::mem;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, trace};

type Registry = FxHashMap<EventName, Arc<[Binding]>>;

static GLOBAL_HUB: OnceLock<EventHub> = OnceLock::new();

/// Outcome counts of a single [`EventHub::trigger`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerReport {
    /// Synchronous handlers that returned successfully.
    pub invoked: usize,
    /// Asynchronous bindings accepted by the dispatcher.
    pub dispatched: usize,
    /// Bindings whose failure was routed to the error handler.
    pub failed: usize,
}

impl TriggerReport {
    /// Number of bindings the trigger visited.
    #[must_use]
    pub const fn bindings(&self) -> usize {
        self.invoked + self.dispatched + self.failed
    }
}

/// Registry and strategies captured by [`EventHub::snapshot`].
#[derive(Clone)]
pub struct HubSnapshot {
    registry: Registry,
    dispatcher: Arc<dyn AsyncDispatcher>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl fmt::Debug for HubSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubSnapshot").field("events", &self.registry.len()).finish_non_exhaustive()
    }
}

struct HubInner {
    registry: RwLock<Registry>,
    dispatcher: RwLock<Arc<dyn AsyncDispatcher>>,
    error_handler: RwLock<Arc<dyn ErrorHandler>>,
}

/// In-process event hub.
///
/// Maps event names to ordered lists of listener bindings. Triggering an event runs the
/// synchronous bindings inline and hands the asynchronous ones to the [`AsyncDispatcher`];
/// a failing binding never affects the others, its error goes to the [`ErrorHandler`].
///
/// Cloning is cheap: all clones share the same registry and strategies.
///
/// # Example
///
/// ```rust
/// use hub_events::{BindingSpec, EventHub, Handlers, Listener, args};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct Totals(AtomicU64);
///
/// impl Listener for Totals {
///     fn handlers(handlers: &mut Handlers<Self>) {
///         handlers.on("handle_order_paid", |totals, args| {
///             totals.0.fetch_add(*args.get::<u64>(0)?, Ordering::SeqCst);
///             Ok(())
///         });
///     }
/// }
///
/// # fn main() -> Result<(), hub_events::HubError> {
/// let totals = Arc::new(Totals::default());
/// let hub = EventHub::new();
/// hub.register([("order_paid", vec![BindingSpec::new(Arc::clone(&totals))])])?;
///
/// let report = hub.trigger("order_paid", args![250_u64]);
/// assert_eq!(report.invoked, 1);
/// assert_eq!(totals.0.load(Ordering::SeqCst), 250);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    /// Hub with no bindings, a [`TokioDispatcher`] and a [`LogErrorHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> EventHubBuilder {
        EventHubBuilder::default()
    }

    /// Process-wide hub, created with defaults on first access.
    pub fn global() -> &'static Self {
        GLOBAL_HUB.get_or_init(Self::new)
    }

    /// Replaces the whole registry with `mapping`.
    ///
    /// Every descriptor of every event is validated before the registry is touched. On
    /// success the hub holds exactly the events of `mapping`; events registered earlier
    /// and not named again are dropped. Use [`EventHub::register_event`] to change a
    /// single event.
    ///
    /// # Errors
    /// Returns [`HubError::Validation`] if an event name is empty or a descriptor has no
    /// listener. The registry is left untouched in that case.
    pub fn register<I, E, B>(&self, mapping: I) -> Result<(), HubError>
    where
        I: IntoIterator<Item = (E, B)>,
        E: Into<EventName>,
        B: IntoIterator<Item = BindingSpec>,
    {
        let registry = mapping
            .into_iter()
            .map(|(event, specs)| validate_event(event.into(), specs))
            .collect::<Result<Registry, _>>()?;

        let events = registry.len();
        let replaced = mem::replace(&mut *self.inner.registry.write(), registry);
        debug!(events, replaced = replaced.len(), "Registry replaced");
        Ok(())
    }

    /// Registers the bindings of a single event, replacing only that event's list.
    ///
    /// # Errors
    /// See [`EventHub::register`].
    pub fn register_event<B>(&self, event: impl Into<EventName>, specs: B) -> Result<(), HubError>
    where
        B: IntoIterator<Item = BindingSpec>,
    {
        let (event, bindings) = validate_event(event.into(), specs)?;
        debug!(event = %event, bindings = bindings.len(), "Registered event bindings");
        self.inner.registry.write().insert(event, bindings);
        Ok(())
    }

    /// Removes all bindings of `event`. Returns whether it was registered.
    pub fn unregister(&self, event: &str) -> bool {
        let removed = self.inner.registry.write().remove(event).is_some();
        if removed {
            debug!(event, "Unregistered event");
        }
        removed
    }

    /// Delivers `args` to every binding of `event`, in registration order.
    ///
    /// An event without bindings is a no-op. Failures (errors, panics, unknown handlers,
    /// dispatcher errors) are reported to the error handler one binding at a time and never
    /// stop the remaining bindings from running.
    pub fn trigger(&self, event: &str, args: Args) -> TriggerReport {
        let mut report = TriggerReport::default();

        // The lock is released before any handler runs, so handlers may re-enter the hub.
        let Some(bindings) = self.inner.registry.read().get(event).cloned() else {
            trace!(event, "No bindings for event");
            return report;
        };
        trace!(event, bindings = bindings.len(), args = args.len(), "Triggering event");

        for binding in bindings.iter() {
            let outcome = match binding.delivery() {
                Delivery::Sync => binding.invoke(&args).map(|()| report.invoked += 1),
                Delivery::Async => self.dispatch(binding, &args).map(|()| report.dispatched += 1),
            };

            if outcome.is_err()
                && let Err(error) = outcome.context(format!(
                    "event `{event}`, listener `{}`, handler `{}`",
                    binding.listener().name(),
                    binding.handler()
                ))
            {
                report.failed += 1;
                self.report(error);
            }
        }

        report
    }

    #[must_use]
    pub fn async_dispatcher(&self) -> Arc<dyn AsyncDispatcher> {
        self.inner.dispatcher.read().clone()
    }

    /// Replaces the dispatcher for all later triggers, returning the previous one.
    pub fn set_async_dispatcher(
        &self,
        dispatcher: Arc<dyn AsyncDispatcher>,
    ) -> Arc<dyn AsyncDispatcher> {
        mem::replace(&mut *self.inner.dispatcher.write(), dispatcher)
    }

    #[must_use]
    pub fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        self.inner.error_handler.read().clone()
    }

    /// Replaces the error handler for all later triggers, returning the previous one.
    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) -> Arc<dyn ErrorHandler> {
        mem::replace(&mut *self.inner.error_handler.write(), handler)
    }

    /// Registered event names, sorted.
    #[must_use]
    pub fn events(&self) -> Vec<EventName> {
        let mut events: Vec<_> = self.inner.registry.read().keys().cloned().collect();
        events.sort();
        events
    }

    #[must_use]
    pub fn bindings(&self, event: &str) -> Vec<Binding> {
        self.inner.registry.read().get(event).map(|b| b.to_vec()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_registered(&self, event: &str) -> bool {
        self.inner.registry.read().contains_key(event)
    }

    /// Captures the registry and both strategies.
    #[must_use]
    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            registry: self.inner.registry.read().clone(),
            dispatcher: self.async_dispatcher(),
            error_handler: self.error_handler(),
        }
    }

    /// Puts back the state captured by [`EventHub::snapshot`].
    pub fn restore(&self, snapshot: HubSnapshot) {
        let mut registry = self.inner.registry.write();
        let mut dispatcher = self.inner.dispatcher.write();
        let mut error_handler = self.inner.error_handler.write();

        *registry = snapshot.registry;
        *dispatcher = snapshot.dispatcher;
        *error_handler = snapshot.error_handler;
        debug!(events = registry.len(), "Restored hub state");
    }

    fn dispatch(&self, binding: &Binding, args: &Args) -> Result<(), InvocationError> {
        let dispatcher = self.async_dispatcher();
        let listener = binding.listener().clone();
        let handler = binding.handler().clone();

        match catch_panic(|| dispatcher.dispatch(listener, handler, args.clone())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(InvocationError::from_dispatcher(error)),
            Err(message) => {
                Err(InvocationError::from_dispatcher(anyhow!("dispatcher panicked: {message}")))
            },
        }
    }

    fn report(&self, error: InvocationError) {
        let handler = self.error_handler();
        if let Err(message) = catch_panic(|| handler.handle(error)) {
            error!(%message, "Error handler panicked");
        }
    }
}

fn validate_event<B>(event: EventName, specs: B) -> Result<(EventName, Arc<[Binding]>), HubError>
where
    B: IntoIterator<Item = BindingSpec>,
{
    if event.as_str().is_empty() {
        return Err(HubError::Validation { message: "event name must not be empty".into(), context: None });
    }

    let bindings = specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| spec.validate(&event, index))
        .collect::<Result<Arc<[Binding]>, _>>()?;
    Ok((event, bindings))
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub").field("events", &self.events()).finish_non_exhaustive()
    }
}

/// Builder for an [`EventHub`] with non-default strategies.
#[derive(Default)]
pub struct EventHubBuilder {
    dispatcher: Option<Arc<dyn AsyncDispatcher>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl EventHubBuilder {
    #[must_use]
    pub fn async_dispatcher(mut self, dispatcher: impl AsyncDispatcher) -> Self {
        self.dispatcher = Some(Arc::new(dispatcher));
        self
    }

    #[must_use]
    pub fn error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn build(self) -> EventHub {
        let dispatcher = self.dispatcher.unwrap_or_else(|| Arc::new(TokioDispatcher::new()));
        let error_handler = self.error_handler.unwrap_or_else(|| Arc::new(LogErrorHandler));

        EventHub {
            inner: Arc::new(HubInner {
                registry: RwLock::new(Registry::default()),
                dispatcher: RwLock::new(dispatcher),
                error_handler: RwLock::new(error_handler),
            }),
        }
    }
}

impl fmt::Debug for EventHubBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHubBuilder")
            .field("dispatcher", &self.dispatcher.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}
