use crate::args::Args;
use crate::invocation::{InvocationError, catch_panic};
use crate::name::HandlerName;
use fxhash::FxHashMap;
use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type Instance = dyn Any + Send + Sync;

/// A handler with its listener type erased.
pub(crate) type ErasedHandler = Arc<dyn Fn(&Instance, &Args) -> anyhow::Result<()> + Send + Sync>;

/// An object that handles events through named handlers.
///
/// Implementors declare their handlers once; the table is built when a [`ListenerRef`]
/// is created and shared by every binding that uses it.
///
/// ```rust
/// use hub_events::{Handlers, Listener};
///
/// struct Audit;
///
/// impl Listener for Audit {
///     fn handlers(handlers: &mut Handlers<Self>) {
///         handlers
///             .on("handle_user_created", |_audit, args| {
///                 let id: &u64 = args.get(0)?;
///                 tracing::info!(id, "user created");
///                 Ok(())
///             })
///             .on("record", |_audit, _args| Ok(()));
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    fn handlers(handlers: &mut Handlers<Self>)
    where
        Self: Sized;
}

/// Handler table under construction for listener type `L`.
pub struct Handlers<L> {
    table: FxHashMap<HandlerName, ErasedHandler>,
    _listener: PhantomData<fn(&L)>,
}

impl<L: Listener> Handlers<L> {
    fn new() -> Self {
        Self { table: FxHashMap::default(), _listener: PhantomData }
    }

    /// Declares `handler`; a later declaration with the same name replaces it.
    pub fn on<F>(&mut self, handler: impl Into<HandlerName>, f: F) -> &mut Self
    where
        F: Fn(&L, &Args) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |instance: &Instance, args: &Args| {
            let listener = instance.downcast_ref::<L>().ok_or_else(|| {
                anyhow::anyhow!("listener instance is not a `{}`", type_name::<L>())
            })?;
            f(listener, args)
        });
        self.table.insert(handler.into(), erased);
        self
    }
}

impl<L> fmt::Debug for Handlers<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").field("names", &self.table.keys().collect::<Vec<_>>()).finish()
    }
}

/// Shared reference to a listener plus its handler table.
///
/// This is the listener handle stored in bindings and passed to async dispatchers.
/// Equality is identity: two refs are equal when they point at the same instance.
#[derive(Clone)]
pub struct ListenerRef {
    instance: Arc<Instance>,
    table: Arc<FxHashMap<HandlerName, ErasedHandler>>,
    name: Cow<'static, str>,
}

impl ListenerRef {
    #[must_use]
    pub fn new<L: Listener>(listener: Arc<L>) -> Self {
        let mut handlers = Handlers::<L>::new();
        L::handlers(&mut handlers);

        Self {
            instance: listener,
            table: Arc::new(handlers.table),
            name: Cow::Borrowed(type_name::<L>()),
        }
    }

    /// Replaces the type name used in logs and errors with a label.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_handler(&self, handler: &str) -> bool {
        self.table.contains_key(handler)
    }

    /// Declared handler names, sorted.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&HandlerName> {
        let mut names: Vec<_> = self.table.keys().collect();
        names.sort();
        names
    }

    /// Invokes `handler` with `args` on the calling thread.
    ///
    /// # Errors
    /// Returns [`InvocationError::UnknownHandler`] if the listener does not declare
    /// `handler`, otherwise whatever the handler raised (panics included).
    pub fn invoke(&self, handler: &HandlerName, args: &Args) -> Result<(), InvocationError> {
        match self.resolve(handler.as_str()) {
            Some(target) => self.call(&target, args),
            None => Err(self.unknown_handler(handler)),
        }
    }

    #[must_use]
    pub fn downcast<L: Listener>(&self) -> Option<Arc<L>> {
        Arc::clone(&self.instance).downcast::<L>().ok()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    pub(crate) fn resolve(&self, handler: &str) -> Option<ErasedHandler> {
        self.table.get(handler).cloned()
    }

    pub(crate) fn call(&self, target: &ErasedHandler, args: &Args) -> Result<(), InvocationError> {
        match catch_panic(|| target(&*self.instance, args)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(InvocationError::from_handler(error)),
            Err(message) => Err(InvocationError::Panicked { message, context: None }),
        }
    }

    pub(crate) fn unknown_handler(&self, handler: &HandlerName) -> InvocationError {
        InvocationError::UnknownHandler {
            listener: self.name.clone(),
            handler: handler.clone(),
            context: None,
        }
    }
}

impl<L: Listener> From<Arc<L>> for ListenerRef {
    fn from(listener: Arc<L>) -> Self {
        Self::new(listener)
    }
}

impl PartialEq for ListenerRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ListenerRef {}

impl fmt::Debug for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRef")
            .field("name", &self.name)
            .field("handlers", &self.handler_names())
            .finish_non_exhaustive()
    }
}

/// Named listeners that configuration files can refer to.
#[derive(Debug, Clone, Default)]
pub struct ListenerDirectory {
    entries: FxHashMap<String, ListenerRef>,
}

impl ListenerDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` under `name`, returning the listener it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        listener: impl Into<ListenerRef>,
    ) -> Option<ListenerRef> {
        self.entries.insert(name.into(), listener.into())
    }

    /// Builder-style [`ListenerDirectory::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, listener: impl Into<ListenerRef>) -> Self {
        self.insert(name, listener);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ListenerRef> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
