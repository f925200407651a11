use accrue_db::{
    attributes, define_entity, traits::Expression as _, DbError, Entity, FromRow, Loaded, Model,
    ModelContainer, ModelDef, Record, Relation, Value,
};
use rusqlite::Row;

use crate::{PageDefaults, Plucked, Repository, UpdateOptions, ALL_COLUMNS};

#[derive(Debug, Clone)]
struct User {
    id: i64,
    name: String,
    age: i64,
    updated_at: Option<String>,
    created_at: Option<String>,
    posts: Vec<Record>,
    profile: Option<Record>,
    loaded: Vec<String>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            posts: vec![],
            profile: None,
            loaded: vec![],
        })
    }
}

impl Entity for User {
    fn set_relation(&mut self, relation: &str, loaded: Loaded) {
        self.loaded.push(relation.to_string());
        match (relation, loaded) {
            ("posts", loaded) => self.posts = loaded.into_records(),
            ("profile", Loaded::One(profile)) => self.profile = profile,
            _ => {}
        }
    }
}

define_entity!(
    users {
        table: "users",
        columns: {
            ID: i64 => "id",
            NAME: String => "name",
            AGE: i64 => "age",
            ACTIVE: bool => "active"
        }
    }
);

impl Model for User {
    const NAME: &'static str = "user";

    fn definition() -> ModelDef {
        ModelDef::new::<Self>(users::TABLE)
            .name("user")
            .relation(Relation::has_many("posts", "posts", "user_id", "id"))
            .relation(Relation::has_one("profile", "profiles", "user_id", "id"))
            .fillable(["name", "age", "active"])
            .timestamps()
            .scope("active", |query, _| Ok(query.filter(users::ACTIVE.eq(true))))
            .scope("older_than", |query, args| match args {
                [Value::Integer(age)] => Ok(query.filter(users::AGE.gt(*age))),
                _ => Err(DbError::ScopeArguments {
                    scope: "older_than".into(),
                    reason: "expected one integer age".into(),
                }),
            })
            .scope("named_like", |query, args| match args {
                [Value::Text(term)] => Ok(query.filter(users::NAME.ilike(term.clone()))),
                _ => Err(DbError::ScopeArguments {
                    scope: "named_like".into(),
                    reason: "expected one search term".into(),
                }),
            })
            .scope("excluding", |query, ids| {
                Ok(query.filter(users::ID.not_in(ids.to_vec())))
            })
            .scope("minor_or_inactive", |query, _| {
                Ok(query.filter(
                    users::AGE
                        .lt(18)
                        .or(users::ACTIVE.eq(false))
                        .and(users::NAME.not_null()),
                ))
            })
    }
}

fn setup() -> ModelContainer {
    let mut container = ModelContainer::open_in_memory().unwrap();
    container
        .execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT,
                updated_at TEXT
            );
            CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT);
            CREATE TABLE profiles (id INTEGER PRIMARY KEY, user_id INTEGER, bio TEXT);
            CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
            INSERT INTO users (name, age, active) VALUES
                ('ada', 36, 1), ('brian', 17, 0), ('carol', 52, 1), ('dave', 25, 1);
            INSERT INTO posts (user_id, title) VALUES (1, 'ada-1'), (1, 'ada-2'), (3, 'carol-1');
            INSERT INTO profiles (user_id, bio) VALUES (3, 'carol bio');",
        )
        .unwrap();
    container.register::<User>().unwrap();
    container.register_table("tags").unwrap();
    container
}

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

#[test]
fn test_construction_requires_bound_model() {
    let empty = ModelContainer::open_in_memory().unwrap();
    assert!(matches!(
        Repository::<User>::new(&empty),
        Err(DbError::Configuration(_))
    ));

    let container = setup();
    assert!(matches!(
        Repository::<Record>::for_model(&container, "user"),
        Err(DbError::Configuration(_))
    ));
    assert!(Repository::<Record>::for_model(&container, "tags").is_ok());
}

#[test]
fn test_get_applies_accumulated_constraints_then_resets() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let found = repo
        .where_op("age", ">", 20)
        .where_in("id", [1, 3, 4])
        .order_by("age", "desc")
        .limit(2)
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["carol", "ada"]);
    assert!(repo.pending().is_empty());

    let everyone = repo.get(ALL_COLUMNS).unwrap();
    assert_eq!(names(&everyone), vec!["ada", "brian", "carol", "dave"]);
}

#[test]
fn test_where_in_scalar_matches_single_element_list() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let scalar = repo.where_in("id", 2).get(ALL_COLUMNS).unwrap();
    let list = repo.where_in("id", [2]).get(ALL_COLUMNS).unwrap();
    assert_eq!(names(&scalar), vec!["brian"]);
    assert_eq!(names(&scalar), names(&list));

    let none = repo.where_in("id", Vec::<i64>::new()).get(ALL_COLUMNS).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_with_overwrites_previous_relations() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let found = repo.with("posts").with("profile").get(ALL_COLUMNS).unwrap();
    for user in &found {
        assert_eq!(user.loaded, vec!["profile"]);
        assert!(user.posts.is_empty());
    }
    let carol = found.iter().find(|u| u.name == "carol").unwrap();
    assert_eq!(
        carol.profile.as_ref().and_then(|p| p.get::<String>("bio")).as_deref(),
        Some("carol bio")
    );

    let found = repo.with(["posts", "profile"]).get(ALL_COLUMNS).unwrap();
    assert_eq!(found[0].loaded, vec!["posts", "profile"]);
    assert_eq!(found[0].posts.len(), 2);
}

#[test]
fn test_all_applies_only_eager_loads() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let found = repo
        .where_("name", "ada")
        .order_by("age", "desc")
        .limit(1)
        .scope("active", ())
        .with("posts")
        .all(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["ada", "brian", "carol", "dave"]);
    assert_eq!(found[0].posts.len(), 2);
    assert!(repo.pending().is_empty());
}

#[test]
fn test_first_and_not_found() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let carol = repo.where_("name", "carol").first(ALL_COLUMNS).unwrap();
    assert_eq!(carol.id, 3);

    let err = repo.where_("name", "nobody").first(ALL_COLUMNS).unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.pending().is_empty());
}

#[test]
fn test_get_by_id_discards_chained_filters() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let brian = repo
        .where_("name", "nobody")
        .limit(0)
        .get_by_id(2, ALL_COLUMNS)
        .unwrap();
    assert_eq!(brian.name, "brian");

    let err = repo.get_by_id(99, ALL_COLUMNS).unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
    assert_eq!(err.to_string(), "No query results for model [user] 99");
}

#[test]
fn test_get_by_id_keeps_eager_loads() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let ada = repo
        .where_("name", "nobody")
        .with("posts")
        .get_by_id(1, ALL_COLUMNS)
        .unwrap();
    assert_eq!(ada.loaded, vec!["posts"]);
    assert_eq!(ada.posts.len(), 2);
    assert!(repo.pending().is_empty());
}

#[test]
fn test_get_by_column() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let carol = repo
        .where_("age", 1000)
        .with("profile")
        .get_by_column("carol", "name", ALL_COLUMNS)
        .unwrap()
        .unwrap();
    assert_eq!(carol.id, 3);
    assert!(carol.profile.is_some());

    assert!(repo
        .get_by_column("zed", "name", ALL_COLUMNS)
        .unwrap()
        .is_none());
}

#[test]
fn test_delete_applies_filters_not_eager_loads() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    // An undeclared relation would fail if eager loads were applied.
    let deleted = repo
        .with("comments")
        .where_("active", false)
        .order_by("age", "desc")
        .limit(10)
        .delete()
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(repo.count().unwrap(), 3);
    assert!(repo.pending().is_empty());
}

#[test]
fn test_delete_applies_scopes_and_sets() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let deleted = repo
        .scope("active", ())
        .where_in("id", [1, 2])
        .delete()
        .unwrap();
    assert_eq!(deleted, 1);

    let left = repo.all(ALL_COLUMNS).unwrap();
    assert_eq!(names(&left), vec!["brian", "carol", "dave"]);
}

#[test]
fn test_delete_by_id() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    assert!(repo.where_("name", "zzz").delete_by_id(2).unwrap());
    assert!(repo.pending().is_empty());
    assert_eq!(repo.count().unwrap(), 3);

    assert!(repo.delete_by_id(2).unwrap_err().is_not_found());
}

#[test]
fn test_delete_multiple_by_id_leaves_pending_untouched() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    repo.where_("name", "ada");
    assert_eq!(repo.delete_multiple_by_id([3, 4, 99]).unwrap(), 2);
    assert_eq!(repo.pending().filters.len(), 1);

    let ada = repo.get(ALL_COLUMNS).unwrap();
    assert_eq!(names(&ada), vec!["ada"]);
}

#[test]
fn test_count_ignores_and_keeps_pending() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    repo.where_("name", "ada").limit(1);
    assert_eq!(repo.count().unwrap(), 4);
    assert_eq!(repo.pending().filters.len(), 1);
    assert_eq!(repo.pending().limit, Some(1));
}

#[test]
fn test_create_multiple_keeps_input_order() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let created = repo
        .where_("name", "ada")
        .create_multiple(vec![
            attributes([("name", Value::Text("eve".into())), ("age", Value::Integer(30))]),
            attributes([("name", Value::Text("finn".into())), ("age", Value::Integer(41))]),
        ])
        .unwrap();

    assert_eq!(names(&created), vec!["eve", "finn"]);
    assert_eq!(created[0].id, 5);
    assert_eq!(created[1].id, 6);
    assert!(repo.pending().is_empty());
    assert_eq!(repo.count().unwrap(), 6);
}

#[test]
fn test_create_fills_timestamps_and_drops_guarded() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let eve = repo
        .create(attributes([
            ("name", Value::Text("eve".into())),
            ("is_admin", Value::Integer(1)),
        ]))
        .unwrap();
    assert_eq!(eve.age, 0);
    assert!(eve.created_at.is_some());
    assert_eq!(eve.created_at, eve.updated_at);
}

#[test]
fn test_update_by_id_and_touch() {
    let container = setup();
    container
        .execute_batch("UPDATE users SET updated_at = '2000-01-01T00:00:00Z'")
        .unwrap();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let ada = repo
        .where_("name", "nobody")
        .update_by_id(
            1,
            attributes([("age", 37)]),
            UpdateOptions {
                touch: false,
            },
        )
        .unwrap();
    assert_eq!(ada.age, 37);
    assert_eq!(ada.updated_at.as_deref(), Some("2000-01-01T00:00:00Z"));
    assert!(repo.pending().is_empty());

    let ada = repo
        .update_by_id(1, attributes([("age", 38)]), UpdateOptions::default())
        .unwrap();
    assert_eq!(ada.age, 38);
    assert_ne!(ada.updated_at.as_deref(), Some("2000-01-01T00:00:00Z"));

    let err = repo
        .update_by_id(99, attributes([("age", 1)]), UpdateOptions::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_pluck_values_and_keyed() {
    let container = setup();
    let mut tags = Repository::<Record>::for_model(&container, "tags").unwrap();
    tags.create_multiple(["x", "y", "z"].map(|name| attributes([("name", name)])))
        .unwrap();

    let plucked = tags.where_("name", "y").pluck("name", None).unwrap();
    assert_eq!(
        plucked,
        Plucked::Values(vec![
            Value::Text("x".into()),
            Value::Text("y".into()),
            Value::Text("z".into()),
        ])
    );
    assert!(tags.pending().is_empty());

    let keyed = tags.pluck("name", Some("id")).unwrap();
    assert_eq!(
        keyed,
        Plucked::Keyed(vec![
            (Value::Integer(1), Value::Text("x".into())),
            (Value::Integer(2), Value::Text("y".into())),
            (Value::Integer(3), Value::Text("z".into())),
        ])
    );
    assert_eq!(keyed.into_values().len(), 3);
}

#[test]
fn test_select_columns_on_record_model() {
    let container = setup();
    let mut tags = Repository::<Record>::for_model(&container, "tags").unwrap();
    tags.create(attributes([("name", "x")])).unwrap();

    let rows = tags.get(&["name"]).unwrap();
    assert_eq!(rows[0].columns(), ["name"]);
}

#[test]
fn test_scope_dispatch_and_replacement() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let found = repo
        .scope("active", ())
        .where_op("age", "<", 40)
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["ada", "dave"]);

    repo.scope("older_than", 60).scope("older_than", 30);
    assert_eq!(repo.pending().scope_calls.len(), 1);
    let found = repo.get(ALL_COLUMNS).unwrap();
    assert_eq!(names(&found), vec!["ada", "carol"]);
}

#[test]
fn test_scope_errors_drain_pending() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let err = repo
        .where_("name", "ada")
        .scope("retired", ())
        .get(ALL_COLUMNS)
        .unwrap_err();
    assert!(matches!(err, DbError::UnknownScope { .. }));
    assert!(repo.pending().is_empty());

    let err = repo.scope("older_than", "old").get(ALL_COLUMNS).unwrap_err();
    assert!(matches!(err, DbError::ScopeArguments { .. }));
    assert_eq!(repo.get(ALL_COLUMNS).unwrap().len(), 4);
}

#[test]
fn test_invalid_input_fails_at_flush_and_drains() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let err = repo
        .where_("name; DROP TABLE users", 1)
        .get(ALL_COLUMNS)
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidIdentifier(_)));
    assert!(repo.pending().is_empty());

    let err = repo.where_op("age", "=~", 1).first(ALL_COLUMNS).unwrap_err();
    assert!(matches!(err, DbError::InvalidOperator(_)));
    assert!(repo.pending().is_empty());

    let err = repo
        .order_by("age", "sideways")
        .paginate(None, ALL_COLUMNS, None, None)
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidDirection(_)));
    assert!(repo.pending().is_empty());

    let err = repo.with("comments").get(ALL_COLUMNS).unwrap_err();
    assert!(matches!(err, DbError::UnknownRelation { .. }));
    assert!(repo.pending().is_empty());

    assert_eq!(repo.get(ALL_COLUMNS).unwrap().len(), 4);
}

#[test]
fn test_paginate_ignores_pending_limit() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let page = repo
        .order_by_asc("id")
        .limit(1)
        .paginate(Some(3), ALL_COLUMNS, None, Some(1))
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 4);
    assert_eq!(page.last_page(), 2);
    assert!(page.has_more_pages());
    assert_eq!(page.page_name, "page");

    let page = repo
        .order_by_asc("id")
        .paginate(Some(3), ALL_COLUMNS, None, Some(2))
        .unwrap();
    assert_eq!(names(&page.items), vec!["dave"]);
    assert_eq!((page.from(), page.to()), (Some(4), Some(4)));
}

#[test]
fn test_paginate_applies_filters_and_scopes() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let page = repo
        .scope("active", ())
        .where_op("age", ">=", 30)
        .paginate(Some(10), ALL_COLUMNS, Some("p"), Some(0))
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.page_name, "p");

    let err = repo.paginate(Some(0), ALL_COLUMNS, None, None).unwrap_err();
    assert!(matches!(err, DbError::InvalidPagination(_)));
}

#[test]
fn test_paginate_defaults_and_page_resolver() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container)
        .unwrap()
        .with_page_defaults(PageDefaults {
            per_page: 2,
            page_name: "p".into(),
        })
        .resolve_pages_with(|name| (name == "p").then_some(2));

    let page = repo
        .order_by_asc("id")
        .paginate(None, ALL_COLUMNS, None, None)
        .unwrap();
    assert_eq!(page.per_page, 2);
    assert_eq!(page.current_page, 2);
    assert_eq!(names(&page.items), vec!["carol", "dave"]);

    let page = repo
        .order_by_asc("id")
        .paginate(None, ALL_COLUMNS, Some("other"), None)
        .unwrap();
    assert_eq!(page.current_page, 1);
    assert_eq!(names(&page.items), vec!["ada", "brian"]);
}

#[test]
fn test_scopes_built_from_column_expressions() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let found = repo.scope("named_like", "AR").get(ALL_COLUMNS).unwrap();
    assert_eq!(names(&found), vec!["carol"]);

    let found = repo
        .scope("excluding", [1, 3])
        .order_by_asc("id")
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["brian", "dave"]);

    let found = repo
        .scope("excluding", Vec::<i64>::new())
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(found.len(), 4);

    let found = repo
        .scope("minor_or_inactive", ())
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["brian"]);

    let found = repo
        .scope("named_like", "a")
        .scope("excluding", 1)
        .order_by_asc("id")
        .get(ALL_COLUMNS)
        .unwrap();
    assert_eq!(names(&found), vec!["brian", "carol", "dave"]);

    let err = repo.scope("named_like", 5).get(ALL_COLUMNS).unwrap_err();
    assert!(matches!(err, DbError::ScopeArguments { .. }));
}

#[test]
fn test_oversized_limit_and_page_saturate() {
    let container = setup();
    let mut repo = Repository::<User>::new(&container).unwrap();

    let (sql, _) = repo.model().new_query().take(u64::MAX).to_sql();
    assert!(sql.ends_with(&format!("LIMIT {}", i64::MAX)));

    let everyone = repo.limit(u64::MAX).get(ALL_COLUMNS).unwrap();
    assert_eq!(everyone.len(), 4);

    let page = repo
        .paginate(Some(25), ALL_COLUMNS, None, Some(u64::MAX / 2))
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 4);
    assert_eq!(page.current_page, u64::MAX / 2);
    assert_eq!(page.from(), None);
}
