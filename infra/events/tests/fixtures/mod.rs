#![allow(dead_code)]

use hub_events::{Args, EventHub, HandlerName, Handlers, HubSnapshot, InvocationError, Listener, ListenerRef};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every `handle_some_event` call with its integer arguments.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Vec<i32>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Vec<i32>> {
        self.calls.lock().clone()
    }
}

impl Listener for Recorder {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on("handle_some_event", |recorder, args| {
            let values: Vec<i32> = (0..args.len()).map(|i| args.get::<i32>(i).copied()).collect::<Result<_, _>>()?;
            recorder.calls.lock().push(values);
            Ok(())
        });
    }
}

/// Declares no handlers at all.
pub struct Silent;

impl Listener for Silent {
    fn handlers(_handlers: &mut Handlers<Self>) {}
}

/// A dispatch captured by [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub listener: ListenerRef,
    pub handler: HandlerName,
    pub args: Vec<i32>,
}

#[derive(Default)]
pub struct RecordingDispatcher {
    seen: Mutex<Vec<Dispatched>>,
}

impl RecordingDispatcher {
    pub fn install(hub: &EventHub) -> Arc<Self> {
        let dispatcher = Arc::new(Self::default());
        let sink = Arc::clone(&dispatcher);
        hub.set_async_dispatcher(Arc::new(
            move |listener: ListenerRef, handler: HandlerName, args: Args| -> anyhow::Result<()> {
                let args = args.iter().filter_map(|arg| arg.downcast_ref::<i32>().copied()).collect();
                sink.seen.lock().push(Dispatched { listener, handler, args });
                Ok(())
            },
        ));
        dispatcher
    }

    pub fn seen(&self) -> Vec<Dispatched> {
        self.seen.lock().clone()
    }
}

#[derive(Default)]
pub struct ErrorLog {
    errors: Mutex<Vec<InvocationError>>,
}

impl ErrorLog {
    pub fn install(hub: &EventHub) -> Arc<Self> {
        let log = Arc::new(Self::default());
        let sink = Arc::clone(&log);
        hub.set_error_handler(Arc::new(move |error: InvocationError| sink.errors.lock().push(error)));
        log
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn take(&self) -> Vec<InvocationError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

/// Puts the global hub back the way it was when dropped.
pub struct GlobalHub {
    saved: Option<HubSnapshot>,
}

impl GlobalHub {
    pub fn capture() -> Self {
        Self { saved: Some(EventHub::global().snapshot()) }
    }

    pub fn hub(&self) -> &'static EventHub {
        EventHub::global()
    }
}

impl Drop for GlobalHub {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            EventHub::global().restore(saved);
        }
    }
}
