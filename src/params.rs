//! Per-resolution parameters.

use derive_more::with_trait::Display;

use crate::{
    binder::BoundArgs,
    context::Context,
    meta::{Entity, FieldInfo},
    value::{Object, Value},
};

/// Type of the operation a field is resolved for.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum OperationType {
    #[default]
    #[display("query")]
    Query,
    #[display("mutation")]
    Mutation,
    #[display("subscription")]
    Subscription,
}

/// Native parameters of a single field resolution, as supplied by the
/// execution engine.
#[derive(Clone, Debug, Default)]
pub struct NativeParams {
    source: Value,
    args: Object,
    context: Context,
    operation: OperationType,
}

impl NativeParams {
    /// Parameters of a field resolved for an `operation`, with a null
    /// source, no arguments and an empty context.
    pub fn new(operation: OperationType) -> Self {
        Self {
            operation,
            ..Self::default()
        }
    }

    /// Sets the raw source of the field.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Value>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the raw arguments of the field.
    #[must_use]
    pub fn with_args(mut self, args: Object) -> Self {
        self.args = args;
        self
    }

    /// Sets the raw context of the request.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Raw source of the field.
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Raw arguments of the field.
    pub fn args(&self) -> &Object {
        &self.args
    }

    /// Raw context of the request.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Type of the operation the field is resolved for.
    pub fn operation(&self) -> OperationType {
        self.operation
    }
}

/// Unified parameters of a field resolution.
///
/// Handlers declaring a parameter of this type receive everything known
/// about the resolution, and so do middlewares.
#[derive(Clone, Debug)]
pub struct ResolveParams {
    field_info: FieldInfo,
    source: Value,
    args: Option<BoundArgs>,
    context: Context,
    params: NativeParams,
}

impl ResolveParams {
    pub(crate) fn new(
        field_info: FieldInfo,
        source: Value,
        args: Option<BoundArgs>,
        params: NativeParams,
    ) -> Self {
        Self {
            field_info,
            source,
            args,
            context: params.context().clone(),
            params,
        }
    }

    /// Field being resolved.
    pub fn field_info(&self) -> &FieldInfo {
        &self.field_info
    }

    /// Determined source of the field.
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Determined source of the field, if it is a `T` entity.
    pub fn source_as<T: Entity>(&self) -> Option<&T> {
        self.source.as_entity()
    }

    /// Bound arguments of the field, if the field declares any.
    ///
    /// Always [`None`] for middlewares, which run before arguments are bound.
    pub fn args(&self) -> Option<&BoundArgs> {
        self.args.as_ref()
    }

    /// Bound arguments of the field, if the field declares them as a `T`.
    pub fn args_as<T: 'static>(&self) -> Option<&T> {
        self.args.as_ref()?.downcast_ref()
    }

    /// Raw context of the request.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Native parameters supplied by the execution engine.
    pub fn params(&self) -> &NativeParams {
        &self.params
    }
}
