//! Request context threaded through to handlers.

use std::{any::Any, fmt, sync::Arc};

use arcstr::ArcStr;
use fnv::FnvHashMap;

/// Raw per-request context, as supplied by the execution engine.
///
/// Holds arbitrary values keyed by name. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<FnvHashMap<ArcStr, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this context extended with `value` under `key`.
    #[must_use]
    pub fn with_value<T>(mut self, key: impl Into<ArcStr>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Arc::make_mut(&mut self.values).insert(key.into(), Arc::new(value));
        self
    }

    /// Raw value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(key).map(|v| &**v)
    }

    /// Value stored under `key`, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.value(key)?.downcast_ref()
    }

    /// Indicates whether anything is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.values.keys().map(ArcStr::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}

/// Typed record a handler may declare as its context parameter.
///
/// Every field is read from the raw [`Context`] under the key produced by
/// [`to_camel_case()`] of the field's name. Missing or differently typed
/// values leave the field at its [`Default`].
///
/// Implement it with the [`context_record!`] macro rather than by hand.
///
/// [`context_record!`]: crate::context_record
/// [`to_camel_case()`]: crate::util::to_camel_case
pub trait ContextRecord: Default + Send + 'static {
    /// Names of the record's fields, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Builds this record out of the raw `ctx`.
    fn from_context(ctx: &Context) -> Self;
}

/// Declares a struct implementing [`ContextRecord`].
///
/// The struct must implement [`Default`], and every field type must
/// implement [`FromContextValue`].
///
/// [`FromContextValue`]: crate::binder::FromContextValue
///
/// ```rust
/// use juniper_router::{Context, ContextRecord as _, context_record};
///
/// context_record! {
///     #[derive(Debug, Default)]
///     pub struct Session {
///         pub user_id: String,
///         pub locale: Option<String>,
///     }
/// }
///
/// let ctx = Context::new().with_value("userId", "ada".to_owned());
/// let session = Session::from_context(&ctx);
///
/// assert_eq!(session.user_id, "ada");
/// assert_eq!(session.locale, None);
///
/// let ctx = ctx.with_value("locale", "en".to_owned());
///
/// assert_eq!(Session::from_context(&ctx).locale.as_deref(), Some("en"));
/// ```
#[macro_export]
macro_rules! context_record {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $(
                $(#[$field_attr])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::ContextRecord for $name {
            const FIELDS: &'static [&'static str] = &[$(::core::stringify!($field)),*];

            fn from_context(ctx: &$crate::Context) -> Self {
                #[allow(unused_mut, reason = "records may declare no fields")]
                let mut record = <Self as ::core::default::Default>::default();
                $(
                    if let ::core::option::Option::Some(v) =
                        $crate::binder::context_value::<$ty>(ctx, ::core::stringify!($field))
                    {
                        record.$field = v;
                    }
                )*
                record
            }
        }
    };
}
