#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the hub crates.
//!
//! * [`macro@hub_error`] turns an enum into a context-aware error type.
//! * [`macro@main`] bootstraps a binary on a pre-configured Tokio runtime
//!   (re-exported as `hub_runtime::main`).
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! hub-derive.workspace = true
//! ```
//!
//! The examples below are `ignore`d because a proc-macro crate cannot use its own macros
//! in doctests; see `tests/ui` for compiled usage.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro to run an `async fn main` on a hub runtime profile.
///
/// The annotated function must be `async` and return a `Result`. The generated `fn main`
/// builds the runtime via `hub_runtime::build_runtime_with_config` and blocks on the body.
///
/// # Arguments
///
/// * `high_performance` - Larger stacks and a longer keep-alive for long-running services.
/// * `memory_efficient` - Half the worker threads and smaller stacks.
/// * `default` (or no argument) - Worker threads detected from available parallelism.
///
/// # Examples
///
/// ```rust,ignore
/// #[hub_runtime::main(memory_efficient)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for declaring error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context(..)`
///   to `Result<T, Name>` and to `Result<T, Source>` for every sourced variant.
/// * **Context Access**: Generates `Name::context_message()` returning the attached context.
/// * **Conversions**: `From<Source>` for sourced variants, plus `From<&'static str>` and
///   `From<String>` when an `Internal { message, context }` variant exists.
/// * **Formatting Helper**: A module-private `format_context` function for `#[error]` strings.
///
/// # Requirements
///
/// 1. Must be applied to an **enum** whose variants all have named fields.
/// 2. A `context` field must have type `Option<Cow<'static, str>>`.
/// 3. Variants with a `source` field (or a field marked `#[source]`/`#[from]`) must also
///    carry `context`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[hub_derive::hub_error]
/// pub enum LoadError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String, LoadError> {
///     std::fs::read_to_string(path).context("Reading listener manifest")
/// }
/// ```
#[proc_macro_attribute]
pub fn hub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
