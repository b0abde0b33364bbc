use crate::name::HandlerName;
use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

/// Failures raised while delivering an event to one binding.
///
/// These never leave `EventHub::trigger`; they are handed to the configured error
/// handler with context naming the event, listener and handler.
#[hub_derive::hub_error]
pub enum InvocationError {
    /// The listener declares no handler under the bound name.
    #[error("Listener `{listener}` has no handler `{handler}`{}", format_context(.context))]
    UnknownHandler {
        listener: Cow<'static, str>,
        handler: HandlerName,
        context: Option<Cow<'static, str>>,
    },

    /// A positional argument was missing or had an unexpected type.
    #[error("Argument mismatch{}: {message}", format_context(.context))]
    Argument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The handler itself returned an error.
    #[error("Handler failed{}: {source}", format_context(.context))]
    Handler { source: anyhow::Error, context: Option<Cow<'static, str>> },

    /// The handler panicked.
    #[error("Handler panicked{}: {message}", format_context(.context))]
    Panicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The async dispatcher failed (or panicked) while accepting the invocation.
    #[error("Async dispatch failed{}: {source}", format_context(.context))]
    Dispatcher { source: Box<dyn Error + Send + Sync>, context: Option<Cow<'static, str>> },
}

impl InvocationError {
    /// Unwraps errors that handlers re-raised with `?`, wrapping everything else.
    pub(crate) fn from_handler(error: anyhow::Error) -> Self {
        error.downcast::<Self>().unwrap_or_else(|source| Self::Handler { source, context: None })
    }

    /// Keeps the dispatcher's own error reachable through `source()` and downcasting.
    pub(crate) fn from_dispatcher(error: anyhow::Error) -> Self {
        Self::Dispatcher { source: error.into(), context: None }
    }
}

/// Runs `f`, converting a panic into its message.
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, Cow<'static, str>> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'static, str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cow::Owned(message.clone())
    } else {
        Cow::Borrowed("non-string panic payload")
    }
}
