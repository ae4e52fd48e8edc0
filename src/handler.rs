//! Handler introspection: turning user functions into routes.
//!
//! A handler is any function returning `Result<T, E>`, where `T` converts
//! [`IntoValue`] and `E` converts into a [`FieldError`]. Its parameters are
//! classified once, when the handler is registered, into an argument plan:
//! - a [`ResolveParams`] parameter receives the unified parameters and may
//!   appear at any position;
//! - the other parameters are positional and receive, in this order, the
//!   source, the arguments and the context of the field.
//!
//! | Role      | Accepted parameter types                                  |
//! |-----------|-----------------------------------------------------------|
//! | source    | `T: Entity + Clone`, `Arc<T: Entity>`, [`Value`], `()`    |
//! | arguments | any [`Arguments`] type ([`Object`] included)              |
//! | context   | [`Context`], any [`ContextRecord`]                        |
//!
//! [`Object`]: crate::Object

use std::{fmt, sync::Arc};

use derive_more::with_trait::Display;

use crate::{
    binder::{self, Arguments, BoundArgs, BoundContext},
    context::{Context, ContextRecord},
    error::{FieldError, ResolveError},
    meta::Entity,
    params::ResolveParams,
    value::{IntoValue, Object, Value},
};

/// Role of a single handler parameter.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ArgRole {
    /// Unified [`ResolveParams`].
    #[display("params")]
    Params,

    /// Source of the field.
    #[display("source")]
    Source,

    /// Bound arguments of the field.
    #[display("args")]
    Args,

    /// Raw or typed context.
    #[display("context")]
    Context,
}

/// Typed context record a handler expects.
#[derive(Clone, Copy)]
pub struct ContextType {
    name: &'static str,
    bind: fn(&Context) -> BoundContext,
}

impl ContextType {
    /// Context bound into a `T` record.
    pub fn of<T: ContextRecord>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            bind: |ctx| BoundContext::Record(Box::new(binder::bind_context::<T>(ctx))),
        }
    }

    /// Rust name of the record type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds the record out of the raw `ctx`.
    pub fn bind(&self, ctx: &Context) -> BoundContext {
        (self.bind)(ctx)
    }
}

impl fmt::Debug for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Single argument of a handler call, assembled according to its plan.
#[derive(Debug)]
pub enum CallArg {
    /// Unified parameters.
    Params(ResolveParams),

    /// Determined source.
    Source(Value),

    /// Bound arguments, if the field declares any.
    Args(Option<BoundArgs>),

    /// Bound or raw context.
    Context(BoundContext),
}

type ErasedHandler = dyn Fn(Vec<CallArg>) -> Result<Value, ResolveError> + Send + Sync;

/// Route of a field: the handler together with its argument plan.
///
/// Created once, when the handler is registered, and never changed after.
#[derive(Clone)]
pub struct RouteParams {
    plan: Arc<[ArgRole]>,
    context: Option<ContextType>,
    handler: Arc<ErasedHandler>,
}

impl RouteParams {
    /// Introspects the provided `handler`.
    pub fn new<H, M>(handler: H) -> Self
    where
        H: Handler<M>,
    {
        Self {
            plan: handler.plan().into(),
            context: handler.context_type(),
            handler: Arc::new(move |args: Vec<CallArg>| handler.call(args)),
        }
    }

    /// Roles of the handler's parameters, in declaration order.
    pub fn plan(&self) -> &[ArgRole] {
        &self.plan
    }

    /// Typed context the handler expects, if any.
    pub fn context_type(&self) -> Option<&ContextType> {
        self.context.as_ref()
    }

    /// Indicates whether both routes call the same handler.
    pub fn same_handler(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }

    /// Calls the handler with arguments assembled according to the
    /// [`plan()`].
    ///
    /// # Errors
    ///
    /// If the arguments don't fit the handler's parameters, or the handler
    /// itself fails.
    ///
    /// [`plan()`]: RouteParams::plan
    pub fn call(&self, args: Vec<CallArg>) -> Result<Value, ResolveError> {
        (self.handler)(args)
    }
}

impl fmt::Debug for RouteParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteParams")
            .field("plan", &self.plan)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Role markers distinguishing the [`Handler`] implementations.
pub mod role {
    /// Unified parameters.
    #[derive(Debug)]
    pub enum Params {}

    /// Source of the field.
    #[derive(Debug)]
    pub enum Source {}

    /// Bound arguments.
    #[derive(Debug)]
    pub enum Args {}

    /// Context.
    #[derive(Debug)]
    pub enum Context {}
}

/// Extraction of a handler parameter of the role `R` out of its [`CallArg`].
pub trait Extract<R>: Sized {
    /// Role of the parameter.
    const ROLE: ArgRole;

    /// Typed context the parameter expects, if any.
    fn context_type() -> Option<ContextType> {
        None
    }

    /// Performs the extraction.
    ///
    /// # Errors
    ///
    /// If the `arg` cannot be converted into this type.
    fn extract(arg: CallArg) -> Result<Self, ResolveError>;
}

impl Extract<role::Params> for ResolveParams {
    const ROLE: ArgRole = ArgRole::Params;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        match arg {
            CallArg::Params(p) => Ok(p),
            _ => Err(ResolveError::PlanMismatch(Self::ROLE)),
        }
    }
}

fn source_arg(arg: CallArg) -> Result<Value, ResolveError> {
    match arg {
        CallArg::Source(v) => Ok(v),
        _ => Err(ResolveError::PlanMismatch(ArgRole::Source)),
    }
}

fn invalid_source<T: Entity>(found: &Value) -> ResolveError {
    ResolveError::InvalidSource {
        expected: T::NAME,
        found: found.type_name(),
    }
}

impl<T: Entity + Clone> Extract<role::Source> for T {
    const ROLE: ArgRole = ArgRole::Source;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        let source = source_arg(arg)?;
        source
            .as_entity::<T>()
            .cloned()
            .ok_or_else(|| invalid_source::<T>(&source))
    }
}

impl<T: Entity> Extract<role::Source> for Arc<T> {
    const ROLE: ArgRole = ArgRole::Source;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        let source = source_arg(arg)?;
        let shared = match &source {
            Value::Entity(e) => e.downcast_arc::<T>(),
            _ => None,
        };
        shared.ok_or_else(|| invalid_source::<T>(&source))
    }
}

impl Extract<role::Source> for Value {
    const ROLE: ArgRole = ArgRole::Source;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        source_arg(arg)
    }
}

impl Extract<role::Source> for () {
    const ROLE: ArgRole = ArgRole::Source;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        source_arg(arg).map(drop)
    }
}

impl<T: Arguments> Extract<role::Args> for T {
    const ROLE: ArgRole = ArgRole::Args;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        match arg {
            CallArg::Args(Some(bound)) => bound.downcast_ref::<T>().cloned().ok_or_else(|| {
                ResolveError::InvalidArguments(serde::de::Error::custom(format_args!(
                    "expected `{}`, found `{}`",
                    std::any::type_name::<T>(),
                    bound.type_name(),
                )))
            }),
            CallArg::Args(None) => {
                binder::map_to_struct(&Object::new()).map_err(ResolveError::InvalidArguments)
            }
            _ => Err(ResolveError::PlanMismatch(Self::ROLE)),
        }
    }
}

impl Extract<role::Context> for Context {
    const ROLE: ArgRole = ArgRole::Context;

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        match arg {
            CallArg::Context(BoundContext::Raw(ctx)) => Ok(ctx),
            _ => Err(ResolveError::PlanMismatch(Self::ROLE)),
        }
    }
}

impl<T: ContextRecord> Extract<role::Context> for T {
    const ROLE: ArgRole = ArgRole::Context;

    fn context_type() -> Option<ContextType> {
        Some(ContextType::of::<T>())
    }

    fn extract(arg: CallArg) -> Result<Self, ResolveError> {
        match arg {
            CallArg::Context(BoundContext::Record(record)) => record
                .downcast::<T>()
                .map(|r| *r)
                .map_err(|_| ResolveError::PlanMismatch(Self::ROLE)),
            CallArg::Context(BoundContext::Raw(ctx)) => Ok(binder::bind_context(&ctx)),
            _ => Err(ResolveError::PlanMismatch(Self::ROLE)),
        }
    }
}

/// Function which may be registered as a route handler.
///
/// Implemented for every function of up to three positional parameters
/// `(source, args, context)`, optionally with a [`ResolveParams`] parameter
/// at any position, returning a `Result`. The `M` marker keeps the
/// implementations apart and is inferred.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a route handler",
    label = "invalid handler",
    note = "handlers take up to three `(source, args, context)` parameters, \
            optionally with a `ResolveParams` at any position, \
            and return `Result<impl IntoValue, impl Into<FieldError>>`"
)]
pub trait Handler<M>: Send + Sync + 'static {
    /// Roles of the handler's parameters, in declaration order.
    fn plan(&self) -> Vec<ArgRole>;

    /// Typed context the handler expects, if any.
    fn context_type(&self) -> Option<ContextType>;

    /// Calls the handler with `args` assembled according to its
    /// [`plan()`].
    ///
    /// # Errors
    ///
    /// If the `args` don't fit the handler's parameters, or the handler
    /// itself fails.
    ///
    /// [`plan()`]: Handler::plan
    fn call(&self, args: Vec<CallArg>) -> Result<Value, ResolveError>;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_handler {
    ($($arg:ident: $ty:ident as $role:ident),*) => {
        impl<F, R, E, $($ty),*> Handler<($((role::$role, $ty),)*)> for F
        where
            F: Fn($($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: IntoValue,
            E: Into<FieldError>,
            $($ty: Extract<role::$role>,)*
        {
            fn plan(&self) -> Vec<ArgRole> {
                vec![$(<$ty as Extract<role::$role>>::ROLE),*]
            }

            fn context_type(&self) -> Option<ContextType> {
                None$(.or_else(<$ty as Extract<role::$role>>::context_type))*
            }

            fn call(&self, args: Vec<CallArg>) -> Result<Value, ResolveError> {
                let roles: [ArgRole; count!($($arg)*)] =
                    [$(<$ty as Extract<role::$role>>::ROLE),*];
                let [$($arg),*] = <[CallArg; count!($($arg)*)]>::try_from(args)
                    .map_err(|args| {
                        let role = roles.get(args.len()).copied();
                        ResolveError::PlanMismatch(role.unwrap_or(ArgRole::Params))
                    })?;
                self($(<$ty as Extract<role::$role>>::extract($arg)?),*)
                    .map(IntoValue::into_value)
                    .map_err(|e| ResolveError::Handler(e.into()))
            }
        }
    };
}

impl_handler!();

impl_handler!(s: S as Source);
impl_handler!(p: P as Params);

impl_handler!(s: S as Source, a: A as Args);
impl_handler!(p: P as Params, s: S as Source);
impl_handler!(s: S as Source, p: P as Params);

impl_handler!(s: S as Source, a: A as Args, c: C as Context);
impl_handler!(p: P as Params, s: S as Source, a: A as Args);
impl_handler!(s: S as Source, p: P as Params, a: A as Args);
impl_handler!(s: S as Source, a: A as Args, p: P as Params);

impl_handler!(p: P as Params, s: S as Source, a: A as Args, c: C as Context);
impl_handler!(s: S as Source, p: P as Params, a: A as Args, c: C as Context);
impl_handler!(s: S as Source, a: A as Args, p: P as Params, c: C as Context);
impl_handler!(s: S as Source, a: A as Args, c: C as Context, p: P as Params);
