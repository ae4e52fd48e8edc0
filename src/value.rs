//! Dynamic values flowing in and out of field resolution.

use std::{any::Any, fmt, sync::Arc};

use derive_more::with_trait::Display;

use crate::meta::Entity;

/// Untyped key/value map, as produced by the execution engine for raw
/// arguments and for sources which are not materialized yet.
pub type Object = serde_json::Map<String, serde_json::Value>;

/// Kind of a [`Value`], reported in routing errors.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Kind {
    #[display("null")]
    Null,
    #[display("boolean")]
    Boolean,
    #[display("int")]
    Int,
    #[display("float")]
    Float,
    #[display("string")]
    String,
    #[display("list")]
    List,
    #[display("map")]
    Map,
    #[display("entity")]
    Entity,
    #[display("shared entity")]
    SharedEntity,
}

/// Typed record of some [`Entity`] type, erased behind an [`Arc`].
#[derive(Clone)]
pub struct EntityValue {
    name: &'static str,
    shared: bool,
    value: Arc<dyn Any + Send + Sync>,
}

impl EntityValue {
    /// Wraps an owned entity.
    pub fn new<T: Entity>(value: T) -> Self {
        Self {
            name: T::NAME,
            shared: false,
            value: Arc::new(value),
        }
    }

    /// Wraps an entity declared by reference.
    pub fn shared<T: Entity>(value: Arc<T>) -> Self {
        Self {
            name: T::NAME,
            shared: true,
            value,
        }
    }

    /// Name of the wrapped [`Entity`] type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Indicates whether this entity was declared by reference.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Borrows the wrapped entity, if it is a `T`.
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Returns a shared handle to the wrapped entity, if it is a `T`.
    pub fn downcast_arc<T: Entity>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast().ok()
    }
}

impl fmt::Debug for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityValue")
            .field("name", &self.name)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl PartialEq for EntityValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// Value of a field source or of a resolved field.
///
/// Entities keep their concrete type, so a resolved entity may become the
/// source of its own fields further down the query.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Object),
    Entity(EntityValue),
}

impl Value {
    /// Constructs a [`Value::Entity`] owning the provided `entity`.
    pub fn entity<T: Entity>(entity: T) -> Self {
        Self::Entity(EntityValue::new(entity))
    }

    /// Constructs a [`Value::Entity`] sharing the provided `entity`.
    pub fn shared<T: Entity>(entity: Arc<T>) -> Self {
        Self::Entity(EntityValue::shared(entity))
    }

    /// Reports the [`Kind`] of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Boolean(_) => Kind::Boolean,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Entity(e) if e.is_shared() => Kind::SharedEntity,
            Self::Entity(_) => Kind::Entity,
        }
    }

    /// Reports the name of this value's type: the [`Entity`] name for
    /// entities, or the [`Kind`] otherwise.
    pub fn type_name(&self) -> String {
        match self {
            Self::Entity(e) => e.name().into(),
            v => v.kind().to_string(),
        }
    }

    /// Does this value represent null?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// View the underlying string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// View the underlying integer value, if present.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// View the underlying untyped map, if present.
    pub fn as_map(&self) -> Option<&Object> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View the underlying list, if present.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// View the underlying entity, if present and of type `T`.
    pub fn as_entity<T: Entity>(&self) -> Option<&T> {
        match self {
            Self::Entity(e) => e.downcast_ref(),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match v {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Boolean(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .unwrap_or_else(|| n.as_f64().map_or(Self::Null, Self::Float)),
            Json::String(s) => Self::String(s),
            Json::Array(a) => Self::List(a.into_iter().map(Self::from).collect()),
            Json::Object(o) => Self::Map(o),
        }
    }
}

/// Conversion of a handler's result into a [`Value`].
pub trait IntoValue {
    /// Performs the conversion.
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.into())
    }
}

impl IntoValue for Object {
    fn into_value(self) -> Value {
        Value::Map(self)
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> Value {
        self.into()
    }
}

macro_rules! impl_into_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self.into())
            }
        }
    )*};
}

impl_into_value! {
    bool => Boolean,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
}

macro_rules! impl_into_value_checked {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoValue for $ty {
            // Beyond the `i64` range, the nearest float is the best we have.
            fn into_value(self) -> Value {
                i64::try_from(self).map_or(Value::Float(self as f64), Value::Int)
            }
        }
    )*};
}

impl_into_value_checked! {
    i128,
    isize,
    u64,
    u128,
    usize,
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: Entity> IntoValue for T {
    fn into_value(self) -> Value {
        Value::entity(self)
    }
}

impl<T: Entity> IntoValue for Arc<T> {
    fn into_value(self) -> Value {
        Value::shared(self)
    }
}
