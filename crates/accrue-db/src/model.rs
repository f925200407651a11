//! Model definitions.
//!
//! A [`ModelDef`] is the static description of an entity type: which table
//! it lives in, its primary key, which relations can be eager loaded, which
//! named scopes can be applied, and how writes are guarded. Definitions are
//! registered in a [`crate::ModelContainer`] and bound to a connection as a
//! [`crate::ModelHandle`].

use std::{
    any::{type_name, TypeId},
    collections::BTreeMap,
    fmt,
    sync::Arc,
};

use tracing::warn;

use crate::{
    connection::{lock, Db},
    error::{DbError, Result},
    ident::Ident,
    query::Query,
    record::Record,
    traits::Entity,
    value::{Attributes, Value},
};

/// A named scope: receives the query under construction and the arguments
/// recorded for it, and returns the narrowed query.
pub type ScopeFn = Arc<dyn Fn(Query, &[Value]) -> Result<Query> + Send + Sync>;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

/// A relation that can be eager loaded with `with(...)`.
///
/// Rows of `related_table` whose `related_key` equals the parent's
/// `parent_key` belong to that parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    pub related_table: String,
    pub parent_key: String,
    pub related_key: String,
}

impl Relation {
    /// `parent.local_key = related.foreign_key`, many related rows.
    pub fn has_many(
        name: impl Into<String>,
        related_table: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::HasMany,
            related_table: related_table.into(),
            parent_key: local_key.into(),
            related_key: foreign_key.into(),
        }
    }

    /// `parent.local_key = related.foreign_key`, at most one related row.
    pub fn has_one(
        name: impl Into<String>,
        related_table: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::HasOne,
            ..Self::has_many(name, related_table, foreign_key, local_key)
        }
    }

    /// `parent.foreign_key = related.owner_key`.
    pub fn belongs_to(
        name: impl Into<String>,
        related_table: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::BelongsTo,
            related_table: related_table.into(),
            parent_key: foreign_key.into(),
            related_key: owner_key.into(),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self.kind, RelationKind::HasOne | RelationKind::BelongsTo)
    }
}

/// Static metadata of a model.
#[derive(Clone)]
pub struct ModelDef {
    name: String,
    table: String,
    primary_key: String,
    relations: BTreeMap<String, Relation>,
    scopes: BTreeMap<String, ScopeFn>,
    fillable: Option<Vec<String>>,
    timestamps: bool,
    entity: TypeId,
    entity_name: &'static str,
}

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

impl ModelDef {
    /// Starts a definition for entity `E` stored in `table`.
    ///
    /// The model name defaults to the table name and the primary key to
    /// `id`.
    pub fn new<E: Entity>(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            name: table.clone(),
            table,
            primary_key: "id".to_string(),
            relations: BTreeMap::new(),
            scopes: BTreeMap::new(),
            fillable: None,
            timestamps: false,
            entity: TypeId::of::<E>(),
            entity_name: type_name::<E>(),
        }
    }

    /// Definition for a [`Record`] model over an existing table.
    ///
    /// The primary key is read from the schema; tables without a declared
    /// key fall back to SQLite's `rowid`.
    pub fn introspect(db: &Db, table: &str) -> Result<Self> {
        let table = Ident::parse(table)?;
        let conn = lock(db)?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let columns = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>("name")?, row.get::<_, i64>("pk")?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(DbError::Configuration(format!(
                "table `{table}` does not exist"
            )));
        }

        let primary_key = columns
            .iter()
            .filter(|(_, pk)| *pk > 0)
            .min_by_key(|(_, pk)| *pk)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "rowid".to_string());
        let timestamps = [CREATED_AT, UPDATED_AT]
            .iter()
            .all(|ts| columns.iter().any(|(name, _)| name == ts));

        let mut def = Self::new::<Record>(table.as_str()).primary_key(primary_key);
        def.timestamps = timestamps;
        Ok(def)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Registers a named scope.
    ///
    /// # Example
    ///
    /// ```rust
    /// use accrue_db::{ModelDef, Record, Value, DbError};
    ///
    /// let def = ModelDef::new::<Record>("users").scope("older_than", |query, args| {
    ///     match args {
    ///         [Value::Integer(age)] => query.where_col("age", ">".parse()?, *age),
    ///         _ => Err(DbError::ScopeArguments {
    ///             scope: "older_than".into(),
    ///             reason: "expected one integer".into(),
    ///         }),
    ///     }
    /// });
    /// assert!(def.has_scope("older_than"));
    /// ```
    pub fn scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(Query, &[Value]) -> Result<Query> + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Arc::new(scope));
        self
    }

    /// Restricts mass assignment to the given columns.
    pub fn fillable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Maintains `created_at` / `updated_at` on writes.
    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_name(&self) -> &str {
        &self.primary_key
    }

    pub fn get_relation(&self, name: &str) -> Result<&Relation> {
        self.relations
            .get(name)
            .ok_or_else(|| DbError::UnknownRelation {
                model: self.name.clone(),
                relation: name.to_string(),
            })
    }

    pub fn get_scope(&self, name: &str) -> Result<&ScopeFn> {
        self.scopes.get(name).ok_or_else(|| DbError::UnknownScope {
            model: self.name.clone(),
            scope: name.to_string(),
        })
    }

    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    pub fn uses_timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn hydrates<E: Entity>(&self) -> bool {
        self.entity == TypeId::of::<E>()
    }

    pub fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    /// Drops attributes outside the fillable list.
    pub fn fill(&self, attributes: Attributes) -> Attributes {
        let Some(fillable) = &self.fillable else {
            return attributes;
        };

        let (kept, dropped): (Attributes, Attributes) = attributes
            .into_iter()
            .partition(|(column, _)| fillable.iter().any(|f| f == column));
        if !dropped.is_empty() {
            warn!(
                model = self.name,
                columns = ?dropped.keys().collect::<Vec<_>>(),
                "dropping non-fillable attributes"
            );
        }
        kept
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .field("scopes", &self.scopes.keys().collect::<Vec<_>>())
            .field("fillable", &self.fillable)
            .field("timestamps", &self.timestamps)
            .field("entity", &self.entity_name)
            .finish()
    }
}
