use crate::invocation::InvocationError;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// One positional argument, type-erased and shareable across threads.
pub type Arg = Arc<dyn Any + Send + Sync>;

/// Positional arguments passed to every handler bound to a triggered event.
///
/// Cloning is cheap (reference counts only), so the same list can be handed to several
/// synchronous handlers and moved into asynchronous dispatches.
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<Arg>,
}

impl Args {
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Appends a value, builder style.
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access to the argument at `index`.
    ///
    /// # Errors
    /// Returns [`InvocationError::Argument`] if there is no argument at `index` or it is
    /// not a `T`. Handlers usually propagate it with `?`.
    pub fn get<T: Any>(&self, index: usize) -> Result<&T, InvocationError> {
        let value = self.values.get(index).ok_or_else(|| InvocationError::Argument {
            message: format!("expected {} at index {index}, got {} argument(s)", type_name::<T>(), self.len())
                .into(),
            context: None,
        })?;

        value.downcast_ref::<T>().ok_or_else(|| InvocationError::Argument {
            message: format!("argument {index} is not a {}", type_name::<T>()).into(),
            context: None,
        })
    }

    /// Untyped access to the argument at `index`.
    #[must_use]
    pub fn get_arc(&self, index: usize) -> Option<&Arg> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.values.iter()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

/// Builds [`Args`] from a list of values.
///
/// ```rust
/// use hub_events::args;
///
/// let args = args![1_u32, "two", String::from("three")];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.get::<&str>(1).unwrap(), &"two");
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}
