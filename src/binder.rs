//! Conversion of untyped arguments and raw context into typed records.
//!
//! The policy is the same for every target type:
//! - fields absent from the input stay at the target's [`Default`];
//! - input keys without a matching target field are dropped silently;
//! - values which cannot be represented in the target's shape are an error.

use std::{any::Any, fmt, sync::Arc};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    context::{Context, ContextRecord},
    util::to_camel_case,
    value::Object,
};

/// Type a field's arguments may be bound into.
///
/// Blanket-implemented for every suitable type, [`Object`] included.
pub trait Arguments: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {}

impl<T> Arguments for T where T: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{}

/// Converts an untyped `input` map into a `T`.
///
/// # Errors
///
/// If the `input` cannot be represented in the shape of `T`.
pub fn map_to_struct<T>(input: &Object) -> serde_json::Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    to_struct(input)
}

/// Converts any serializable `input` into a `T` by a round trip through
/// [`serde_json::Value`], with field names and `#[serde]` attributes of `T`
/// governing the mapping.
///
/// Fields the `input` lacks take their values from a serialized [`Default`]
/// of `T`, so they keep their default values even without `#[serde(default)]`.
/// Only the fields the deserializer reports missing are filled in, and
/// fields present in the `input` are never merged with their defaults.
///
/// # Errors
///
/// If the `input` cannot be serialized, or cannot be represented in the
/// shape of `T`.
pub fn to_struct<I, T>(input: &I) -> serde_json::Result<T>
where
    I: Serialize + ?Sized,
    T: Serialize + DeserializeOwned + Default,
{
    let mut input = serde_json::to_value(input)?;
    let mut defaults = None;
    loop {
        let err = match <T as Deserialize>::deserialize(&input) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let Some(field) = missing_field(&err) else {
            return Err(err);
        };
        if defaults.is_none() {
            defaults = Some(serde_json::to_value(T::default())?);
        }
        if !defaults
            .as_ref()
            .is_some_and(|d| fill_missing(&mut input, d, field))
        {
            return Err(err);
        }
    }
}

/// Name of the field a deserialization `err` reports as missing, if any.
fn missing_field(err: &serde_json::Error) -> Option<String> {
    err.to_string()
        .strip_prefix("missing field `")?
        .strip_suffix('`')
        .map(str::to_owned)
}

/// Inserts the default of the `field` into the first object of the `input`
/// (depth-first, outermost first) lacking it, whose counterpart in `defaults`
/// declares it.
///
/// Returns `false` if there is no such object.
fn fill_missing(input: &mut serde_json::Value, defaults: &serde_json::Value, field: String) -> bool {
    use serde_json::Value as Json;

    let (Json::Object(input), Json::Object(defaults)) = (input, defaults) else {
        return false;
    };
    if !input.contains_key(&field) {
        if let Some(default) = defaults.get(&field) {
            input.insert(field, default.clone());
            return true;
        }
    }
    input.iter_mut().any(|(key, value)| {
        defaults
            .get(key)
            .is_some_and(|d| fill_missing(value, d, field.clone()))
    })
}

/// Builds a `T` record out of the raw `ctx`.
pub fn bind_context<T: ContextRecord>(ctx: &Context) -> T {
    T::from_context(ctx)
}

/// Reads the value of the record `field` from the raw `ctx`.
///
/// The lookup key is [`to_camel_case()`] of the `field` name. Returns [`None`]
/// if the key is absent or holds a value the `T` cannot be read from.
pub fn context_value<T: FromContextValue>(ctx: &Context, field: &str) -> Option<T> {
    ctx.value(&to_camel_case(field))
        .and_then(T::from_context_value)
}

/// Type of a [`ContextRecord`] field, readable from a raw [`Context`] value.
///
/// The default implementation reads a value stored exactly as `Self`, so
/// implementing it for a custom type is a one-liner:
///
/// ```rust
/// # use juniper_router::binder::FromContextValue;
/// #[derive(Clone)]
/// struct Tenant(u64);
///
/// impl FromContextValue for Tenant {}
/// ```
///
/// [`Option`] fields read both `Option<T>` and bare `T` values.
pub trait FromContextValue: Any + Clone {
    /// Reads `Self` out of a raw context `value`.
    fn from_context_value(value: &(dyn Any + Send + Sync)) -> Option<Self> {
        value.downcast_ref::<Self>().cloned()
    }
}

impl<T: FromContextValue> FromContextValue for Option<T> {
    fn from_context_value(value: &(dyn Any + Send + Sync)) -> Option<Self> {
        value
            .downcast_ref::<Self>()
            .cloned()
            .or_else(|| T::from_context_value(value).map(Some))
    }
}

macro_rules! impl_from_context_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FromContextValue for $ty {}
    )*};
}

impl_from_context_value! {
    bool, char, String, ArcStr, Context,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
}

impl<T: Any + Clone> FromContextValue for Vec<T> {}

impl<T: ?Sized + 'static> FromContextValue for Arc<T> {}

/// Arguments bound into their declared type.
#[derive(Clone)]
pub struct BoundArgs {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl BoundArgs {
    /// Wraps already bound arguments.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Rust name of the bound type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the bound arguments, if they are a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl fmt::Debug for BoundArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundArgs")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Context handed to a handler's context parameter.
pub enum BoundContext {
    /// Raw context, passed through unchanged.
    Raw(Context),

    /// Typed [`ContextRecord`].
    Record(Box<dyn Any + Send>),
}

impl fmt::Debug for BoundContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(ctx) => f.debug_tuple("Raw").field(ctx).finish(),
            Self::Record(_) => f.debug_tuple("Record").finish_non_exhaustive(),
        }
    }
}
