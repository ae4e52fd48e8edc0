mod common;

use juniper_router::{ArgRole, EntityMeta, FieldResult, Object, RegistrationError, Router, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use self::common::{PageArgs, User, query_on};

fn friends(_: User, page: PageArgs) -> FieldResult<Vec<String>> {
    Ok((0..page.limit).map(|i| format!("friend{i}")).collect())
}

#[test]
fn discovers_tagged_and_conventional_fields() {
    let user = EntityMeta::of::<User>();
    let mut builder = Router::builder();
    builder
        .query("User.Name", |u: User| -> FieldResult<String> { Ok(u.name) })
        .unwrap()
        .use_resolve("friends", friends)
        .unwrap();

    let routable = builder.discover(&user);

    assert_eq!(routable, ["User.Name", "User.Email", "User.Friends"]);

    let router = builder.build();
    assert!(!router.is_routable("User.Age"));
    assert!(!router.is_routable("User.Avatar"));

    let email = user.field_info(user.field_by_name("Email").unwrap());
    assert_eq!(
        router.resolve(&email, &query_on(User::ada())).unwrap(),
        Value::String("ada@example.com".into()),
    );

    let friends = user.field_info(user.field_by_name("Friends").unwrap());
    let params = query_on(User::ada()).with_args(Object::from_iter([("limit".into(), json!(2))]));
    assert_eq!(
        router.resolve(&friends, &params).unwrap(),
        Value::List(vec![
            Value::String("friend0".into()),
            Value::String("friend1".into()),
        ]),
    );
}

#[test]
fn explicit_route_wins_over_tag_and_method() {
    let user = EntityMeta::of::<User>();
    let mut builder = Router::builder();
    builder
        .use_resolve("friends", friends)
        .unwrap()
        .query("User.Friends", |_: User| -> FieldResult<i32> { Ok(-1) })
        .unwrap()
        .query("User.Email", |_: User| -> FieldResult<&'static str> { Ok("hidden") })
        .unwrap();

    assert!(builder.is_resolve(&user, user.field_by_name("Friends").unwrap()));
    assert!(builder.is_resolve(&user, user.field_by_name("Email").unwrap()));

    let table = builder.table();
    assert_eq!(table.get("User.Friends").unwrap().plan(), [ArgRole::Source]);
    assert!(
        !table
            .get("User.Email")
            .unwrap()
            .same_handler(user.method_by_name("ResolveEmail").unwrap()),
    );
}

#[test]
fn discovery_is_idempotent() {
    let user = EntityMeta::of::<User>();
    let mut builder = Router::builder();
    builder.use_resolve("friends", friends).unwrap();

    let first = builder.discover(&user);
    let snapshot = builder
        .table()
        .paths()
        .map(|p| (p.clone(), builder.table().get(p).unwrap().clone()))
        .collect::<Vec<_>>();
    let second = builder.discover(&user);

    assert_eq!(first, second);
    assert_eq!(builder.table().len(), snapshot.len());
    for (path, route) in &snapshot {
        let again = builder.table().get(path).unwrap();
        assert!(route.same_handler(again), "{path}");
        assert_eq!(route.plan(), again.plan(), "{path}");
    }
}

#[test]
fn dangling_tag_falls_back_to_not_routable() {
    let user = EntityMeta::of::<User>();
    let mut builder = Router::builder();

    assert!(!builder.is_resolve(&user, user.field_by_name("Avatar").unwrap()));
    assert!(!builder.is_resolve(&user, user.field_by_name("Friends").unwrap()));
    assert!(builder.table().is_empty());

    builder.use_resolve("avatar", |_: ()| -> FieldResult<Value> { Ok(Value::Null) }).unwrap();
    assert!(builder.is_resolve(&user, user.field_by_name("Avatar").unwrap()));
}

#[test]
fn named_resolver_is_shared_between_fields() {
    let mut user = EntityMeta::of::<User>();
    user.field("Followers").tag("resolve", "friends");
    let mut builder = Router::builder();
    builder.use_resolve("friends", friends).unwrap();

    builder.discover(&user);

    let table = builder.table();
    let named = table.named("friends").unwrap();
    assert!(table.get("User.Friends").unwrap().same_handler(named));
    assert!(table.get("User.Followers").unwrap().same_handler(named));
}

#[test]
fn rejects_malformed_registrations() {
    let mut builder = Router::builder();

    assert_eq!(
        builder.query("UserName", friends).map(|_| ()),
        Err(RegistrationError::InvalidPath("UserName".into())),
    );
    assert_eq!(
        builder.use_resolve("friends,paged", friends).map(|_| ()),
        Err(RegistrationError::InvalidResolverName("friends,paged".into())),
    );
    assert_eq!(
        RegistrationError::InvalidPath("UserName".into()).to_string(),
        "Invalid route path `UserName`, expected `Type.Field`",
    );
}
