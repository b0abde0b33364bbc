use crate::args::Args;
use crate::invocation::InvocationError;
use crate::listener::ListenerRef;
use crate::name::HandlerName;
use tokio::runtime::Handle;
use tracing::{error, warn};

/// Runs invocations of bindings marked asynchronous.
///
/// The hub calls `dispatch` on the triggering thread and never invokes the listener itself
/// for such bindings. An `Err` (or a panic) from `dispatch` is reported to the error
/// handler; whatever happens inside work the dispatcher scheduled is its own concern.
///
/// Closures with the matching signature are dispatchers:
///
/// ```rust
/// use hub_events::{EventHub, HandlerName, ListenerRef, Args};
/// use std::sync::Arc;
///
/// let hub = EventHub::new();
/// let on_thread = |listener: ListenerRef, handler: HandlerName, args: Args| -> anyhow::Result<()> {
///     std::thread::spawn(move || listener.invoke(&handler, &args));
///     Ok(())
/// };
/// hub.set_async_dispatcher(Arc::new(on_thread));
/// ```
pub trait AsyncDispatcher: Send + Sync + 'static {
    /// # Errors
    /// Returns an error if the invocation could not be scheduled.
    fn dispatch(&self, listener: ListenerRef, handler: HandlerName, args: Args) -> anyhow::Result<()>;
}

impl<F> AsyncDispatcher for F
where
    F: Fn(ListenerRef, HandlerName, Args) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn dispatch(&self, listener: ListenerRef, handler: HandlerName, args: Args) -> anyhow::Result<()> {
        self(listener, handler, args)
    }
}

/// Receives every failure isolated by `EventHub::trigger`.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, error: InvocationError);
}

impl<F> ErrorHandler for F
where
    F: Fn(InvocationError) + Send + Sync + 'static,
{
    fn handle(&self, error: InvocationError) {
        self(error);
    }
}

/// Default dispatcher: runs each invocation on Tokio's blocking pool.
///
/// Uses the runtime the caller is running inside, if any, otherwise the process-global
/// runtime of `hub-runtime`. Failures of the spawned invocation are logged.
#[derive(Debug, Clone, Default)]
pub struct TokioDispatcher {
    handle: Option<Handle>,
}

impl TokioDispatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Pins the dispatcher to a specific runtime.
    #[must_use]
    pub const fn with_handle(handle: Handle) -> Self {
        Self { handle: Some(handle) }
    }
}

impl AsyncDispatcher for TokioDispatcher {
    fn dispatch(&self, listener: ListenerRef, handler: HandlerName, args: Args) -> anyhow::Result<()> {
        let handle = self.handle.clone().unwrap_or_else(hub_runtime::handle);

        // Detached: the join handle is dropped and the task keeps running.
        drop(handle.spawn_blocking(move || {
            if let Err(error) = listener.invoke(&handler, &args) {
                warn!(listener = listener.name(), handler = %handler, %error, "Async handler failed");
            }
        }));
        Ok(())
    }
}

/// Runs "async" invocations on the triggering thread and reports their failures back to
/// the hub, which turns them into [`InvocationError::Dispatcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl AsyncDispatcher for InlineDispatcher {
    fn dispatch(&self, listener: ListenerRef, handler: HandlerName, args: Args) -> anyhow::Result<()> {
        listener.invoke(&handler, &args).map_err(anyhow::Error::from)
    }
}

/// Default error handler: logs and moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, error: InvocationError) {
        error!(%error, "Event invocation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{Handlers, Listener};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        calls: AtomicUsize,
    }

    impl Listener for Probe {
        fn handlers(handlers: &mut Handlers<Self>) {
            handlers.on("handle_probe", |probe, _args| {
                probe.calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
    }

    #[test]
    fn inline_dispatcher_invokes_and_reports() {
        let probe = Arc::new(Probe::default());
        let listener = ListenerRef::new(Arc::clone(&probe));

        InlineDispatcher.dispatch(listener.clone(), "handle_probe".into(), Args::new()).unwrap();
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        let err = InlineDispatcher.dispatch(listener, "missing".into(), Args::new()).unwrap_err();
        assert!(err.to_string().contains("has no handler `missing`"), "{err}");
    }

    #[test]
    fn closures_are_strategies() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler = move |_error: InvocationError| {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        handler.handle(InvocationError::Panicked { message: "x".into(), context: None });
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let dispatcher = |_l: ListenerRef, handler: HandlerName, _a: Args| -> anyhow::Result<()> {
            anyhow::ensure!(handler == "handle_probe", "unexpected handler {handler}");
            Ok(())
        };
        let listener = ListenerRef::new(Arc::new(Probe::default()));
        assert!(dispatcher.dispatch(listener.clone(), "handle_probe".into(), Args::new()).is_ok());
        assert!(dispatcher.dispatch(listener, "other".into(), Args::new()).is_err());
    }

    #[test]
    fn log_error_handler_only_logs() {
        LogErrorHandler.handle(InvocationError::Argument { message: "index 0".into(), context: None });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_dispatcher_runs_off_the_calling_thread() {
        let probe = Arc::new(Probe::default());
        let listener = ListenerRef::new(Arc::clone(&probe));

        TokioDispatcher::new().dispatch(listener, "handle_probe".into(), Args::new()).unwrap();

        for _ in 0..200 {
            if probe.calls.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("blocking task never ran");
    }
}
