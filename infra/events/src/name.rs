use std::borrow::{Borrow, Cow};
use std::fmt;

const HANDLER_PREFIX: &str = "handle_";

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&'static str> for $name {
            fn from(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Cow::Owned(name))
            }
        }

        impl From<Cow<'static, str>> for $name {
            fn from(name: Cow<'static, str>) -> Self {
                Self(name)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_type! {
    /// Stable symbolic name of an event, e.g. `user_created`.
    EventName
}

name_type! {
    /// Name of a handler declared by a listener, e.g. `handle_user_created`.
    HandlerName
}

impl HandlerName {
    /// Handler used when a binding does not name one: `handle_<event>`.
    #[must_use]
    pub fn for_event(event: &EventName) -> Self {
        Self(Cow::Owned(format!("{HANDLER_PREFIX}{event}")))
    }
}
