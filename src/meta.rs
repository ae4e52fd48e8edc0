//! Types used to describe entities and their fields to the router.
//!
//! These are produced by the schema side (whatever turns Rust types into a
//! GraphQL schema) and consumed by [`RouterBuilder::is_resolve()`] during
//! setup, and by the [`Router`] on every field resolution as [`FieldInfo`].
//!
//! [`Router`]: crate::Router
//! [`RouterBuilder::is_resolve()`]: crate::RouterBuilder::is_resolve

use std::{any::Any, fmt, sync::Arc};

use arcstr::ArcStr;
use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::{
    binder::{self, Arguments, BoundArgs},
    handler::{Handler, RouteParams},
    value::{Object, Value},
};

/// Name of the field tag referencing a named resolver.
pub const RESOLVE_TAG: &str = "resolve";

/// Prefix of the naming-convention resolver methods of an [`Entity`].
pub const RESOLVE_METHOD_PREFIX: &str = "Resolve";

/// Typed record which may act as the source of field resolution.
///
/// ```rust
/// use juniper_router::{Entity, EntityMeta, FieldResult};
///
/// #[derive(Clone, Default)]
/// struct User {
///     name: String,
///     age: i32,
/// }
///
/// impl User {
///     fn resolve_age(self) -> FieldResult<i32> {
///         Ok(self.age)
///     }
/// }
///
/// impl Entity for User {
///     const NAME: &'static str = "User";
///
///     fn describe(meta: &mut EntityMeta) {
///         meta.field("Name");
///         meta.field("Age");
///         meta.method("ResolveAge", User::resolve_age);
///     }
/// }
/// ```
pub trait Entity: Any + Send + Sync {
    /// Type name, used as the first segment of a route path.
    const NAME: &'static str;

    /// Declares the fields of this entity, their tags and the
    /// naming-convention resolver methods.
    fn describe(meta: &mut EntityMeta) {
        let _ = meta;
    }
}

/// Declared type of a field's source.
#[derive(Clone, Copy)]
pub struct SourceType {
    name: &'static str,
    shared: bool,
    zero: fn() -> Value,
}

impl SourceType {
    /// Source declared by value.
    pub fn of<T: Entity + Default>() -> Self {
        Self {
            name: T::NAME,
            shared: false,
            zero: || Value::entity(T::default()),
        }
    }

    /// Source declared by reference.
    pub fn shared<T: Entity + Default>() -> Self {
        Self {
            name: T::NAME,
            shared: true,
            zero: || Value::shared(Arc::new(T::default())),
        }
    }

    /// Name of the declared [`Entity`] type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Indicates whether the source is declared by reference.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Constructs a zero-valued instance of the declared type.
    pub fn zero(&self) -> Value {
        (self.zero)()
    }
}

impl fmt::Debug for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceType")
            .field("name", &self.name)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

/// Declared type of a field's arguments.
#[derive(Clone, Copy)]
pub struct ArgsType {
    name: &'static str,
    bind: fn(&Object) -> serde_json::Result<BoundArgs>,
}

impl ArgsType {
    /// Arguments bound into a `T`.
    pub fn of<T: Arguments>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            bind: |raw| binder::map_to_struct::<T>(raw).map(BoundArgs::new),
        }
    }

    /// Rust name of the declared type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Converts the raw arguments of a field into the declared type.
    ///
    /// # Errors
    ///
    /// If the `raw` arguments cannot be represented in the declared type.
    pub fn bind(&self, raw: &Object) -> serde_json::Result<BoundArgs> {
        (self.bind)(raw)
    }
}

impl fmt::Debug for ArgsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgsType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Schema field being resolved.
///
/// Supplied by the execution engine on every call to [`Router::resolve()`].
///
/// [`Router::resolve()`]: crate::Router::resolve
#[derive(Clone, Debug)]
pub struct FieldInfo {
    path: ArcStr,
    source: SourceType,
    args: Option<ArgsType>,
}

impl FieldInfo {
    /// Describes the field at `path` (`Type.Field`) of a `source` type,
    /// declaring no arguments.
    pub fn new(path: impl Into<ArcStr>, source: SourceType) -> Self {
        Self {
            path: path.into(),
            source,
            args: None,
        }
    }

    /// Declares the type the field's arguments are bound into.
    #[must_use]
    pub fn with_args(mut self, args: ArgsType) -> Self {
        self.args = Some(args);
        self
    }

    /// Dispatch path of the field.
    pub fn path(&self) -> &ArcStr {
        &self.path
    }

    /// Name of the field, the last segment of its [`path()`].
    ///
    /// [`path()`]: FieldInfo::path
    pub fn field_name(&self) -> &str {
        self.path
            .rsplit_once('.')
            .map_or(self.path.as_str(), |(_, f)| f)
    }

    /// Declared type of the field's source.
    pub fn source(&self) -> &SourceType {
        &self.source
    }

    /// Declared type of the field's arguments, if any.
    pub fn args(&self) -> Option<&ArgsType> {
        self.args.as_ref()
    }
}

/// Declared field of an [`Entity`].
#[derive(Clone, Debug)]
pub struct FieldMeta {
    name: ArcStr,
    tags: IndexMap<ArcStr, ArcStr>,
    args: Option<ArgsType>,
}

impl FieldMeta {
    fn new(name: ArcStr) -> Self {
        Self {
            name,
            tags: IndexMap::new(),
            args: None,
        }
    }

    /// Attaches a declarative `key:"value"` tag to this field.
    pub fn tag(&mut self, key: impl Into<ArcStr>, value: impl Into<ArcStr>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Declares the type this field's arguments are bound into.
    pub fn args<T: Arguments>(&mut self) -> &mut Self {
        self.args = Some(ArgsType::of::<T>());
        self
    }

    /// Name of this field.
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Value of the tag `key`, if declared.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(ArcStr::as_str)
    }

    /// Name of the named resolver referenced by the [`RESOLVE_TAG`], if any.
    ///
    /// Only the first comma-separated segment of the tag names the resolver,
    /// the rest are options.
    pub fn resolve_tag(&self) -> Option<&str> {
        self.tag_value(RESOLVE_TAG)
            .and_then(|v| v.split(',').next())
            .filter(|name| !name.is_empty())
    }

    /// Declared type of this field's arguments, if any.
    pub fn args_type(&self) -> Option<&ArgsType> {
        self.args.as_ref()
    }
}

/// Description of an [`Entity`] type: its fields and naming-convention
/// resolver methods.
#[derive(Clone, Debug)]
pub struct EntityMeta {
    name: ArcStr,
    source: SourceType,
    fields: Vec<FieldMeta>,
    methods: FnvHashMap<ArcStr, RouteParams>,
}

impl EntityMeta {
    /// Describes the `T` entity, declared by value.
    pub fn of<T: Entity + Default>() -> Self {
        Self::with_source::<T>(SourceType::of::<T>())
    }

    /// Describes the `T` entity, declared by reference.
    pub fn shared<T: Entity + Default>() -> Self {
        Self::with_source::<T>(SourceType::shared::<T>())
    }

    fn with_source<T: Entity>(source: SourceType) -> Self {
        let mut meta = Self {
            name: ArcStr::from(T::NAME),
            source,
            fields: Vec::new(),
            methods: FnvHashMap::default(),
        };
        T::describe(&mut meta);
        meta
    }

    /// Declares a new field, returning it for further description.
    pub fn field(&mut self, name: impl Into<ArcStr>) -> &mut FieldMeta {
        self.fields.push(FieldMeta::new(name.into()));
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    /// Declares a resolver method, introspecting the `handler` right away.
    ///
    /// Methods named `Resolve<Field>` are discovered as the routes of the
    /// respective fields.
    pub fn method<H, M>(&mut self, name: impl Into<ArcStr>, handler: H) -> &mut Self
    where
        H: Handler<M>,
    {
        self.methods.insert(name.into(), RouteParams::new(handler));
        self
    }

    /// Name of the described entity.
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Declared source type of the described entity.
    pub fn source(&self) -> &SourceType {
        &self.source
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Declared field by its `name`.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared resolver method by its `name`.
    pub fn method_by_name(&self, name: &str) -> Option<&RouteParams> {
        self.methods.get(name)
    }

    /// Route path of the provided `field` of this entity.
    pub fn path(&self, field: &FieldMeta) -> ArcStr {
        arcstr::format!("{}.{}", self.name, field.name)
    }

    /// [`FieldInfo`] the execution engine passes when resolving `field`.
    pub fn field_info(&self, field: &FieldMeta) -> FieldInfo {
        FieldInfo {
            path: self.path(field),
            source: self.source,
            args: field.args,
        }
    }
}
