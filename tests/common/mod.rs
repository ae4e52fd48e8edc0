//! Fixtures shared by the integration tests.

#![allow(dead_code, reason = "not every test uses every fixture")]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use juniper_router::{
    Context, Entity, EntityMeta, FieldInfo, FieldResult, NativeParams, OperationType, SourceType,
    Value, context_record,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub name: String,
    pub age: i32,
}

impl User {
    pub fn ada() -> Self {
        Self {
            name: "Ada".into(),
            age: 36,
        }
    }

    fn resolve_email(self) -> FieldResult<String> {
        Ok(format!("{}@example.com", self.name.to_lowercase()))
    }
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn describe(meta: &mut EntityMeta) {
        meta.field("Name");
        meta.field("Age");
        meta.field("Email");
        meta.field("Friends")
            .tag("resolve", "friends,paged")
            .args::<PageArgs>();
        meta.field("Avatar").tag("resolve", "avatar");
        meta.method("ResolveEmail", User::resolve_email);
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PageArgs {
    pub limit: i32,
}

context_record! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Session {
        pub user_id: String,
        pub locale: Option<String>,
    }
}

/// [`FieldInfo`] of the `field` of a [`User`], declared by value.
pub fn user_field(field: &str) -> FieldInfo {
    FieldInfo::new(format!("User.{field}"), SourceType::of::<User>())
}

/// Query parameters with the provided `user` as the source.
pub fn query_on(user: User) -> NativeParams {
    NativeParams::new(OperationType::Query).with_source(Value::entity(user))
}

pub fn session_context(user_id: &str) -> Context {
    Context::new().with_value("userId", user_id.to_owned())
}

/// Counter of invocations, shareable with handlers and middlewares.
#[derive(Clone, Debug, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
