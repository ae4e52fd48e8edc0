#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

// Public because `context_record!` expands to calls into it.
pub mod binder;
mod context;
mod error;
pub mod handler;
pub mod meta;
mod middleware;
mod params;
mod resolve;
mod router;
pub mod util;
pub mod value;

#[doc(inline)]
pub use self::{
    binder::{Arguments, BoundArgs, FromContextValue},
    context::{Context, ContextRecord},
    error::{FieldError, FieldResult, RegistrationError, ResolveError},
    handler::{ArgRole, Handler, RouteParams},
    meta::{ArgsType, Entity, EntityMeta, FieldInfo, FieldMeta, SourceType},
    middleware::{Middleware, MiddlewareChain},
    params::{NativeParams, OperationType, ResolveParams},
    resolve::FieldResolver,
    router::{RouteTable, Router, RouterBuilder},
    value::{IntoValue, Kind, Object, Value},
};
