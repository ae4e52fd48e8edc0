//! Route table and its two-phase lifecycle.
//!
//! Routes are registered and discovered on a [`RouterBuilder`] during a
//! single-threaded setup phase. [`RouterBuilder::build()`] then freezes them
//! into a [`Router`], which is only ever read while serving, so it may be
//! shared across any number of concurrent resolutions without locking.

use std::{ops::ControlFlow, sync::Arc};

use arcstr::ArcStr;
use fnv::{FnvBuildHasher, FnvHashMap};
use indexmap::IndexMap;
use static_assertions::assert_impl_all;
use tracing::{debug, warn};

use crate::{
    error::{FieldError, RegistrationError},
    handler::{Handler, RouteParams},
    meta::{EntityMeta, FieldMeta, RESOLVE_METHOD_PREFIX},
    middleware::MiddlewareChain,
    params::ResolveParams,
    value::Value,
};

/// Field routes and named resolvers.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    fields: IndexMap<ArcStr, RouteParams, FnvBuildHasher>,
    named: FnvHashMap<ArcStr, RouteParams>,
}

impl RouteTable {
    /// Route bound to the `path`.
    pub fn get(&self, path: &str) -> Option<&RouteParams> {
        self.fields.get(path)
    }

    /// Named resolver registered under the `name`.
    pub fn named(&self, name: &str) -> Option<&RouteParams> {
        self.named.get(name)
    }

    /// Indicates whether a route is bound to the `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    /// Paths of all bound routes, in the order they were first bound.
    pub fn paths(&self) -> impl Iterator<Item = &ArcStr> {
        self.fields.keys()
    }

    /// Number of bound routes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Indicates whether no routes are bound.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn bind(&mut self, path: ArcStr, route: RouteParams) {
        debug!(%path, plan = ?route.plan(), "binding field route");
        self.fields.insert(path, route);
    }
}

fn validate_path(path: &ArcStr) -> Result<(), RegistrationError> {
    match path.split_once('.') {
        Some((ty, field)) if !ty.is_empty() && !field.is_empty() && !field.contains('.') => Ok(()),
        _ => Err(RegistrationError::InvalidPath(path.clone())),
    }
}

/// Setup phase of a [`Router`].
///
/// ```rust
/// # use juniper_router::{Entity, FieldResult, RouterBuilder, RegistrationError};
/// #[derive(Clone, Default)]
/// struct User {
///     name: String,
/// }
///
/// impl Entity for User {
///     const NAME: &'static str = "User";
/// }
///
/// fn name(user: User) -> FieldResult<String> {
///     Ok(user.name)
/// }
///
/// # fn main() -> Result<(), RegistrationError> {
/// let mut builder = RouterBuilder::new();
/// builder.query("User.Name", name)?;
/// let router = builder.build();
///
/// assert!(router.is_routable("User.Name"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RouterBuilder {
    table: RouteTable,
    middleware: MiddlewareChain,
}

impl RouterBuilder {
    /// Creates a builder with no routes and no middlewares.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the `handler` to the field at `path` (`Type.Field`), replacing
    /// any route bound to it before.
    ///
    /// # Errors
    ///
    /// If the `path` is not of the `Type.Field` form.
    pub fn query<H, M>(
        &mut self,
        path: impl Into<ArcStr>,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        H: Handler<M>,
    {
        self.route(path, RouteParams::new(handler))
    }

    /// Binds an already introspected `route` to the field at `path`.
    ///
    /// # Errors
    ///
    /// If the `path` is not of the `Type.Field` form.
    pub fn route(
        &mut self,
        path: impl Into<ArcStr>,
        route: RouteParams,
    ) -> Result<&mut Self, RegistrationError> {
        let path = path.into();
        validate_path(&path)?;
        self.table.bind(path, route);
        Ok(self)
    }

    /// Registers the `handler` as a named resolver, reusable by any field
    /// tagged with `resolve:"<name>"`.
    ///
    /// # Errors
    ///
    /// If the `name` is empty.
    pub fn use_resolve<H, M>(
        &mut self,
        name: impl Into<ArcStr>,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        H: Handler<M>,
    {
        let name = name.into();
        if name.is_empty() || name.contains(',') {
            return Err(RegistrationError::InvalidResolverName(name));
        }
        let route = RouteParams::new(handler);
        debug!(%name, plan = ?route.plan(), "registering named resolver");
        self.table.named.insert(name, route);
        Ok(self)
    }

    /// Appends a middleware, run before every field resolution in
    /// registration order.
    pub fn use_middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&ResolveParams) -> Result<ControlFlow<Value>, FieldError> + Send + Sync + 'static,
    {
        self.middleware.push(f);
        self
    }

    /// Indicates whether the `field` of the `entity` is routable, binding its
    /// route if it is discovered rather than registered explicitly.
    ///
    /// Strategies, in priority order:
    /// 1. a route already bound to the field's path;
    /// 2. a named resolver referenced by the field's `resolve` tag;
    /// 3. a `Resolve<Field>` method declared by the entity.
    pub fn is_resolve(&mut self, entity: &EntityMeta, field: &FieldMeta) -> bool {
        let path = entity.path(field);
        if self.table.contains(&path) {
            return true;
        }

        if let Some(name) = field.resolve_tag() {
            if let Some(route) = self.table.named(name).cloned() {
                debug!(%path, resolver = name, "discovered tagged field");
                self.table.bind(path, route);
                return true;
            }
            warn!(%path, resolver = name, "field references unknown named resolver");
        }

        let method = format!("{RESOLVE_METHOD_PREFIX}{}", field.name());
        if let Some(route) = entity.method_by_name(&method).cloned() {
            debug!(%path, %method, "discovered resolver method");
            self.table.bind(path, route);
            return true;
        }

        false
    }

    /// Runs [`is_resolve()`] over every declared field of the `entity`,
    /// returning the paths of the routable ones.
    ///
    /// [`is_resolve()`]: RouterBuilder::is_resolve
    pub fn discover(&mut self, entity: &EntityMeta) -> Vec<ArcStr> {
        entity
            .fields()
            .iter()
            .filter(|field| self.is_resolve(entity, field))
            .map(|field| entity.path(field))
            .collect()
    }

    /// Route table built so far.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Freezes the registered routes and middlewares into a [`Router`].
    pub fn build(self) -> Router {
        debug!(
            routes = self.table.len(),
            middlewares = self.middleware.len(),
            "router built"
        );
        Router {
            inner: Arc::new(Inner {
                table: self.table,
                middleware: self.middleware,
            }),
        }
    }
}

#[derive(Debug)]
struct Inner {
    table: RouteTable,
    middleware: MiddlewareChain,
}

/// Frozen, read-only routes and middlewares, serving field resolutions.
///
/// Cloning is cheap, and clones share the same routes.
#[derive(Clone, Debug)]
pub struct Router {
    inner: Arc<Inner>,
}

assert_impl_all!(Router: Clone, Send, Sync);

impl Router {
    /// Starts the setup phase of a new [`Router`].
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Frozen route table.
    pub fn table(&self) -> &RouteTable {
        &self.inner.table
    }

    /// Registered middlewares.
    pub fn middleware(&self) -> &MiddlewareChain {
        &self.inner.middleware
    }

    /// Indicates whether a route is bound to the `path`.
    pub fn is_routable(&self, path: &str) -> bool {
        self.table().contains(path)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use pretty_assertions::assert_eq;

    use super::RouterBuilder;
    use crate::{EntityMeta, FieldResult, RegistrationError, Value, meta::Entity};

    #[derive(Clone, Debug, Default)]
    struct Starship {
        name: String,
        length: f64,
    }

    impl Starship {
        fn resolve_length(self) -> FieldResult<f64> {
            Ok(self.length)
        }
    }

    impl Entity for Starship {
        const NAME: &'static str = "Starship";

        fn describe(meta: &mut EntityMeta) {
            meta.field("Name");
            meta.field("Length");
            meta.field("Pilots").tag("resolve", "pilots,list");
            meta.field("Cargo").tag("resolve", "cargo");
            meta.method("ResolveLength", Starship::resolve_length);
        }
    }

    fn pilots(_: Starship) -> FieldResult<Vec<String>> {
        Ok(vec!["Han".into()])
    }

    fn name(ship: Starship) -> FieldResult<String> {
        Ok(ship.name)
    }

    #[test]
    fn discovers_by_priority() {
        let meta = EntityMeta::of::<Starship>();
        let mut builder = RouterBuilder::new();
        builder.query("Starship.Name", name).unwrap();
        builder.use_resolve("pilots", pilots).unwrap();

        let field = |n| meta.field_by_name(n).unwrap();

        assert!(builder.is_resolve(&meta, field("Name")));
        assert!(builder.is_resolve(&meta, field("Pilots")));
        assert!(builder.is_resolve(&meta, field("Length")));
        assert!(!builder.is_resolve(&meta, field("Cargo")));

        let table = builder.table();
        assert!(
            table
                .get("Starship.Pilots")
                .unwrap()
                .same_handler(table.named("pilots").unwrap()),
        );
        assert!(
            table
                .get("Starship.Length")
                .unwrap()
                .same_handler(meta.method_by_name("ResolveLength").unwrap()),
        );
        assert!(!table.contains("Starship.Cargo"));
    }

    #[test]
    fn discovery_is_idempotent() {
        let meta = EntityMeta::of::<Starship>();
        let length = meta.field_by_name("Length").unwrap();
        let mut builder = RouterBuilder::new();

        assert!(builder.is_resolve(&meta, length));
        let first = builder.table().get("Starship.Length").cloned().unwrap();
        assert!(builder.is_resolve(&meta, length));
        let second = builder.table().get("Starship.Length").unwrap();

        assert!(first.same_handler(second));
        assert_eq!(first.plan(), second.plan());
        assert_eq!(builder.table().len(), 1);
    }

    #[test]
    fn discovers_whole_entity() {
        let meta = EntityMeta::of::<Starship>();
        let mut builder = RouterBuilder::new();
        builder.use_resolve("cargo", |_: Starship| -> FieldResult<i32> { Ok(0) }).unwrap();

        assert_eq!(
            builder.discover(&meta),
            ["Starship.Length", "Starship.Cargo"],
        );
        assert_eq!(
            builder.table().paths().map(|p| p.as_str()).collect::<Vec<_>>(),
            ["Starship.Length", "Starship.Cargo"],
        );
    }

    #[test]
    fn explicit_registration_overwrites() {
        let mut builder = RouterBuilder::new();
        builder.query("Starship.Name", name).unwrap();
        let first = builder.table().get("Starship.Name").cloned().unwrap();
        builder
            .query("Starship.Name", |_: Value| -> FieldResult<String> { Ok("?".into()) })
            .unwrap();

        assert!(!first.same_handler(builder.table().get("Starship.Name").unwrap()));
        assert_eq!(builder.table().len(), 1);
    }

    #[test]
    fn rejects_invalid_registrations() {
        let mut builder = RouterBuilder::new();

        for path in ["Starship", ".Name", "Starship.", "A.B.C"] {
            assert_eq!(
                builder.query(path, name).map(|_| ()),
                Err(RegistrationError::InvalidPath(path.into())),
            );
        }
        assert_eq!(
            builder.use_resolve("", pilots).map(|_| ()),
            Err(RegistrationError::InvalidResolverName("".into())),
        );
        assert!(builder.table().is_empty());
    }

    #[test]
    fn builds_frozen_router() {
        let mut builder = RouterBuilder::new();
        builder.query("Starship.Name", name).unwrap();
        builder.use_middleware(|_| Ok(ControlFlow::Continue(())));
        let router = builder.build();

        assert!(router.is_routable("Starship.Name"));
        assert!(!router.is_routable("Starship.Length"));
        assert_eq!(router.middleware().len(), 1);
        assert_eq!(router.clone().table().len(), 1);
    }
}
