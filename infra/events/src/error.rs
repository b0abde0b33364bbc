use std::borrow::Cow;

/// Errors returned to callers of the hub's registration API.
#[hub_derive::hub_error]
pub enum HubError {
    /// A binding descriptor was rejected before any registry mutation took place.
    #[error("Invalid registration{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
