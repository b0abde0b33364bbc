use hub_derive::hub_error;
use std::borrow::Cow;

#[hub_error]
pub enum DispatchError {
    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Closed")]
    Closed {},
}

fn main() {
    let err: Result<(), DispatchError> =
        Err(DispatchError::Rejected { message: "full".into(), context: None });
    let err = err.context("event `user_created`").unwrap_err();
    assert_eq!(err.context_message(), Some("event `user_created`"));
    assert_eq!(err.to_string(), "Rejected (event `user_created`): full");
    assert_eq!(DispatchError::Closed {}.context_message(), None);
}
