//! Resolution of a single field against a frozen [`Router`].

use std::{ops::ControlFlow, sync::Arc};

use arcstr::ArcStr;
use indexmap::IndexMap;
use tracing::{trace, trace_span};

use crate::{
    binder::{BoundArgs, BoundContext},
    error::{FieldResult, ResolveError},
    handler::{ArgRole, CallArg, RouteParams},
    meta::FieldInfo,
    params::{NativeParams, OperationType, ResolveParams},
    router::Router,
    value::Value,
};

/// Resolver callback handed to the execution engine for every routed field.
pub type FieldResolver = Arc<dyn Fn(&FieldInfo, &NativeParams) -> FieldResult<Value> + Send + Sync>;

/// Source the field is resolved against.
///
/// Untyped maps stand for data not materialized yet, so they're replaced with
/// a zero value of the declared source type. Anything else passes through.
fn determine_source(field_info: &FieldInfo, params: &NativeParams) -> Value {
    match params.source() {
        Value::Map(_) => field_info.source().zero(),
        source => source.clone(),
    }
}

impl Router {
    /// Resolves the field described by `field_info`.
    ///
    /// Runs the middlewares first, any of which may settle the resolution on
    /// its own. Otherwise, calls the route bound to the field's path with its
    /// parameters assembled according to the route's plan.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Middleware`] if a middleware fails;
    /// - [`ResolveError::UnsupportedOperation`] if the field is resolved for a
    ///   subscription and no middleware settled it;
    /// - [`ResolveError::NotFoundRoute`] if no route is bound to the path;
    /// - [`ResolveError::InvalidArguments`] if the raw arguments cannot be
    ///   bound into the declared type;
    /// - [`ResolveError::InvalidSource`] if the source doesn't fit the
    ///   handler;
    /// - [`ResolveError::Handler`] if the handler fails.
    pub fn resolve(
        &self,
        field_info: &FieldInfo,
        params: &NativeParams,
    ) -> Result<Value, ResolveError> {
        let span = trace_span!("resolve", path = %field_info.path());
        let _guard = span.enter();

        let source = determine_source(field_info, params);

        if !self.middleware().is_empty() {
            let unified =
                ResolveParams::new(field_info.clone(), source.clone(), None, params.clone());
            if let ControlFlow::Break(v) = self
                .middleware()
                .run(&unified)
                .map_err(ResolveError::Middleware)?
            {
                trace!("settled by middleware");
                return Ok(v);
            }
        }

        if params.operation() == OperationType::Subscription {
            return Err(ResolveError::UnsupportedOperation);
        }

        self.resolve_query(field_info, params)
    }

    /// Resolves the field described by `field_info` with its route only,
    /// bypassing middlewares and the operation gate.
    ///
    /// # Errors
    ///
    /// Same as [`Router::resolve()`], except the middleware and operation
    /// ones.
    pub fn resolve_query(
        &self,
        field_info: &FieldInfo,
        params: &NativeParams,
    ) -> Result<Value, ResolveError> {
        let source = determine_source(field_info, params);

        let route = self
            .table()
            .get(field_info.path())
            .ok_or_else(|| ResolveError::NotFoundRoute {
                path: field_info.path().clone(),
                type_name: source.type_name(),
                kind: source.kind(),
            })?;

        let args = field_info
            .args()
            .map(|ty| ty.bind(params.args()))
            .transpose()
            .map_err(ResolveError::InvalidArguments)?;

        let context = match route.context_type() {
            Some(ty) => ty.bind(params.context()),
            None => BoundContext::Raw(params.context().clone()),
        };

        let call_args = assemble(route, field_info, source, args, context, params)?;
        trace!(plan = ?route.plan(), "calling handler");
        route.call(call_args)
    }

    /// Same as [`Router::resolve()`], but with the error converted for the
    /// execution engine.
    ///
    /// # Errors
    ///
    /// See [`ResolveError::into_field_error()`].
    pub fn resolve_field(&self, field_info: &FieldInfo, params: &NativeParams) -> FieldResult<Value> {
        self.resolve(field_info, params)
            .map_err(ResolveError::into_field_error)
    }

    /// Single resolver callback serving every routed field of this [`Router`].
    pub fn resolver(&self) -> FieldResolver {
        let router = self.clone();
        Arc::new(move |field_info: &FieldInfo, params: &NativeParams| {
            router.resolve_field(field_info, params)
        })
    }

    /// Resolver callbacks of all the routed paths, for the schema side to
    /// attach to its fields.
    pub fn routes(&self) -> IndexMap<ArcStr, FieldResolver> {
        let resolver = self.resolver();
        self.table()
            .paths()
            .map(|path| (path.clone(), Arc::clone(&resolver)))
            .collect()
    }
}

fn assemble(
    route: &RouteParams,
    field_info: &FieldInfo,
    source: Value,
    args: Option<BoundArgs>,
    context: BoundContext,
    params: &NativeParams,
) -> Result<Vec<CallArg>, ResolveError> {
    let mut context = Some(context);
    route
        .plan()
        .iter()
        .map(|role| -> Result<CallArg, ResolveError> {
            Ok(match role {
                ArgRole::Params => CallArg::Params(ResolveParams::new(
                    field_info.clone(),
                    source.clone(),
                    args.clone(),
                    params.clone(),
                )),
                ArgRole::Source => CallArg::Source(source.clone()),
                ArgRole::Args => CallArg::Args(args.clone()),
                ArgRole::Context => CallArg::Context(
                    context
                        .take()
                        .ok_or(ResolveError::PlanMismatch(ArgRole::Context))?,
                ),
            })
        })
        .collect()
}
