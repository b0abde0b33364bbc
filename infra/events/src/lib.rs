//! # Event Hub
//!
//! An in-process publish/subscribe hub: named events, ordered listener bindings, and
//! synchronous or asynchronous delivery with isolated failures.
//!
//! ## Overview
//!
//! Listeners declare named handlers once through the [`Listener`] trait. Bindings tie a
//! listener (and a handler name, `handle_<event>` by default) to an event. Triggering an
//! event walks its bindings in registration order:
//!
//! * **Sync** bindings run inline on the triggering thread.
//! * **Async** bindings are handed to the [`AsyncDispatcher`] (Tokio's blocking pool by
//!   default).
//! * Any failure of one binding is routed to the [`ErrorHandler`] and the next binding
//!   still runs.
//!
//! ## Features
//!
//! * **Fail-fast registration**: every descriptor is validated before the registry changes.
//! * **Pluggable strategies**: dispatcher and error handler can be swapped at runtime.
//! * **Config-driven wiring**: [`EventsConfig`] resolves bindings by listener name.
//! * **Low overhead**: `FxHashMap` + `parking_lot::RwLock`, snapshots released before
//!   handlers run.
//!
//! # Example
//!
//! ```rust
//! use hub_events::{BindingSpec, EventHub, Handlers, Listener, InlineDispatcher, args};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Mailer { sent: AtomicUsize }
//!
//! impl Listener for Mailer {
//!     fn handlers(handlers: &mut Handlers<Self>) {
//!         handlers
//!             .on("handle_user_created", |mailer, args| {
//!                 let _email: &String = args.get(1)?;
//!                 mailer.sent.fetch_add(1, Ordering::SeqCst);
//!                 Ok(())
//!             })
//!             .on("welcome", |mailer, _args| {
//!                 mailer.sent.fetch_add(1, Ordering::SeqCst);
//!                 Ok(())
//!             });
//!     }
//! }
//!
//! # fn main() -> Result<(), hub_events::HubError> {
//! let mailer = Arc::new(Mailer::default());
//! let hub = EventHub::builder().async_dispatcher(InlineDispatcher).build();
//!
//! hub.register([(
//!     "user_created",
//!     vec![
//!         BindingSpec::new(Arc::clone(&mailer)),
//!         BindingSpec::new(Arc::clone(&mailer)).handler("welcome").asynchronous(),
//!     ],
//! )])?;
//!
//! let report = hub.trigger("user_created", args![42_u64, String::from("a@b.c")]);
//! assert_eq!((report.invoked, report.dispatched), (1, 1));
//! assert_eq!(mailer.sent.load(Ordering::SeqCst), 2);
//! # Ok(())
//! # }
//! ```

mod args;
mod binding;
mod config;
mod error;
mod hub;
mod invocation;
mod listener;
mod name;
mod strategy;

pub use args::{Arg, Args};
pub use binding::{Binding, BindingSpec, Delivery};
pub use config::{BindingConfig, EventsConfig};
pub use error::{HubError, HubErrorExt};
pub use hub::{EventHub, EventHubBuilder, HubSnapshot, TriggerReport};
pub use invocation::{InvocationError, InvocationErrorExt};
pub use listener::{Handlers, Listener, ListenerDirectory, ListenerRef};
pub use name::{EventName, HandlerName};
pub use strategy::{AsyncDispatcher, ErrorHandler, InlineDispatcher, LogErrorHandler, TokioDispatcher};
