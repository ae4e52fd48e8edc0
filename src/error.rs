//! Errors of route registration and field resolution.

use arcstr::ArcStr;
use derive_more::with_trait::{Display, Error};
use serde::{Serialize, Serializer, ser::SerializeMap as _};
use serde_json::json;

use crate::{handler::ArgRole, value::Kind};

/// Error type for errors that occur during field resolution
///
/// Field errors are represented by a human-readable error message and an
/// optional [`serde_json::Value`] structure containing additional
/// information.
///
/// They can be converted to from any type that implements [`Display`],
/// which makes error chaining with the `?` operator a breeze:
///
/// ```rust
/// # use juniper_router::FieldError;
/// fn get_string(data: Vec<u8>) -> Result<String, FieldError> {
///     let s = String::from_utf8(data)?;
///     Ok(s)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    extensions: serde_json::Value,
}

impl<T: Display> From<T> for FieldError {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            extensions: serde_json::Value::Null,
        }
    }
}

impl FieldError {
    /// Construct a new [`FieldError`] with additional data.
    ///
    /// The `extensions` end up in the `"extensions"` field of the error
    /// object in the response. If they are [`serde_json::Value::Null`], no
    /// extra data is included.
    pub fn new<T: Display>(e: T, extensions: serde_json::Value) -> Self {
        Self {
            message: e.to_string(),
            extensions,
        }
    }

    /// Returns the `"message"` field of this [`FieldError`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"extensions"` field of this [`FieldError`].
    ///
    /// If there is no `"extensions"`, then [`serde_json::Value::Null`] is
    /// returned.
    #[must_use]
    pub fn extensions(&self) -> &serde_json::Value {
        &self.extensions
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let len = if self.extensions.is_null() { 1 } else { 2 };
        let mut map = ser.serialize_map(Some(len))?;

        map.serialize_key("message")?;
        map.serialize_value(&self.message)?;

        if !self.extensions.is_null() {
            map.serialize_key("extensions")?;
            map.serialize_value(&self.extensions)?;
        }

        map.end()
    }
}

/// The result of resolving the value of a field of type `T`
pub type FieldResult<T> = Result<T, FieldError>;

/// Error of a single field resolution.
#[derive(Debug, Display, Error)]
pub enum ResolveError {
    /// Source value could not be coerced into the shape the handler expects.
    #[display("Invalid source: expected `{expected}`, found `{found}`")]
    InvalidSource {
        /// Type the handler expects.
        expected: &'static str,
        /// Reported type of the actual source.
        found: String,
    },

    /// No route is registered for the resolved path.
    #[display("Not found route for path {path} by source {type_name},{kind}")]
    NotFoundRoute {
        /// Path of the field being resolved.
        path: ArcStr,
        /// Reported type of the resolved source.
        type_name: String,
        /// Reported kind of the resolved source.
        kind: Kind,
    },

    /// Raw arguments could not be converted into the declared type.
    #[display("Invalid args {_0}")]
    InvalidArguments(serde_json::Error),

    /// Subscription reached ordinary field resolution with no middleware
    /// claiming it.
    #[display("Unsupported resolve")]
    UnsupportedOperation,

    /// Error returned by a middleware.
    #[display("{}", _0.message())]
    Middleware(#[error(not(source))] FieldError),

    /// Error returned by a route handler.
    #[display("{}", _0.message())]
    Handler(#[error(not(source))] FieldError),

    /// Call arguments do not follow the handler's argument plan.
    #[display("Call argument does not match the `{_0}` parameter of the handler")]
    PlanMismatch(#[error(not(source))] ArgRole),
}

impl ResolveError {
    /// Stable machine-readable code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSource { .. } => "INVALID_SOURCE",
            Self::NotFoundRoute { .. } => "NOT_FOUND_ROUTE",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::Middleware(_) => "MIDDLEWARE",
            Self::Handler(_) => "HANDLER",
            Self::PlanMismatch(_) => "PLAN_MISMATCH",
        }
    }

    /// Converts this error into a [`FieldError`] for the execution engine.
    ///
    /// Errors of middlewares and handlers are passed through verbatim.
    #[must_use]
    pub fn into_field_error(self) -> FieldError {
        match self {
            Self::Middleware(e) | Self::Handler(e) => e,
            e => FieldError::new(&e, json!({ "code": e.code() })),
        }
    }
}

/// Error of route registration, fatal at setup time.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum RegistrationError {
    /// Route path is not of the `Type.Field` form.
    #[display("Invalid route path `{_0}`, expected `Type.Field`")]
    InvalidPath(#[error(not(source))] ArcStr),

    /// Named resolver is registered under an empty name, or a name
    /// containing a comma.
    #[display("Invalid named resolver name `{_0}`")]
    InvalidResolverName(#[error(not(source))] ArcStr),
}
