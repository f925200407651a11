//! Model registry and live model handles.

use std::{collections::HashMap, path::Path, sync::Arc};

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use tracing::debug;

use crate::{
    connection::{self, execute, lock, query_one, Db},
    error::{DbError, Result},
    ident::Ident,
    model::{ModelDef, CREATED_AT, UPDATED_AT},
    query::Query,
    traits::{Entity, Model},
    value::{display_value, Attributes, IntoSqlValue, IntoValues},
};

/// Resolves model names into live [`ModelHandle`]s.
///
/// The container owns the connection every handle it makes shares.
#[derive(Debug, Clone)]
pub struct ModelContainer {
    db: Db,
    models: HashMap<String, Arc<ModelDef>>,
}

impl ModelContainer {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            models: HashMap::new(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(connection::open_in_memory()?))
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Runs raw SQL, e.g. schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(sql, "executing batch");
        lock(&self.db)?.execute_batch(sql)?;
        Ok(())
    }

    /// Registers a statically bound model under [`Model::NAME`].
    pub fn register<M: Model>(&mut self) -> Result<&mut Self> {
        self.register_def(M::NAME, M::definition())
    }

    /// Binds `name` to a definition, replacing any earlier binding.
    pub fn register_def(&mut self, name: impl Into<String>, def: ModelDef) -> Result<&mut Self> {
        Ident::parse(def.table())?;
        Ident::parse(def.key_name())?;

        let name = name.into();
        debug!(model = name, table = def.table(), "registered model");
        self.models.insert(name, Arc::new(def));
        Ok(self)
    }

    /// Registers an existing table as a [`crate::Record`] model named after
    /// the table.
    pub fn register_table(&mut self, table: &str) -> Result<&mut Self> {
        let def = ModelDef::introspect(&self.db, table)?;
        self.register_def(table, def)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolves `name` into a handle hydrating `E`.
    ///
    /// Fails with [`DbError::Configuration`] when nothing is bound to `name`
    /// or the bound model hydrates a different entity type.
    pub fn make<E: Entity>(&self, name: &str) -> Result<ModelHandle> {
        let def = self
            .models
            .get(name)
            .ok_or_else(|| DbError::Configuration(format!("no model is bound to `{name}`")))?;

        if !def.hydrates::<E>() {
            return Err(DbError::Configuration(format!(
                "model `{}` hydrates `{}`, not `{}`",
                name,
                def.entity_name(),
                std::any::type_name::<E>()
            )));
        }

        Ok(ModelHandle {
            db: self.db.clone(),
            def: Arc::clone(def),
        })
    }
}

/// A model definition bound to a live connection.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    db: Db,
    def: Arc<ModelDef>,
}

impl ModelHandle {
    pub fn definition(&self) -> &ModelDef {
        &self.def
    }

    /// Starts a fresh query against this model's table.
    pub fn new_query(&self) -> Query {
        Query::new(self.db.clone(), Arc::clone(&self.def))
    }

    /// Inserts one row and returns it as stored.
    pub fn create<E: Entity>(&self, attributes: Attributes) -> Result<E> {
        let mut attributes = self.def.fill(attributes);
        if self.def.uses_timestamps() {
            let now = Value::Text(timestamp());
            attributes
                .entry(CREATED_AT.to_string())
                .or_insert_with(|| now.clone());
            attributes.entry(UPDATED_AT.to_string()).or_insert(now);
        }

        let (columns, params) = split_attributes(attributes)?;
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING *", self.def.table())
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                self.def.table(),
                columns
                    .iter()
                    .map(Ident::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                vec!["?"; params.len()].join(", ")
            )
        };

        query_one(&self.db, &sql, &params, E::from_row)?.ok_or_else(|| {
            DbError::Configuration(format!(
                "insert into `{}` returned no row",
                self.def.table()
            ))
        })
    }

    /// Updates the row with primary key `id` and returns it as stored.
    ///
    /// With `touch` set, a timestamped model's `updated_at` is refreshed
    /// unless the caller supplies it.
    pub fn update_by_key<E: Entity>(
        &self,
        id: impl IntoSqlValue,
        attributes: Attributes,
        touch: bool,
    ) -> Result<E> {
        let id = id.into_sql_value();
        let mut attributes = self.def.fill(attributes);
        if touch && self.def.uses_timestamps() {
            attributes
                .entry(UPDATED_AT.to_string())
                .or_insert_with(|| Value::Text(timestamp()));
        }

        if attributes.is_empty() {
            return self.new_query().find_or_fail(id);
        }

        let (columns, mut params) = split_attributes(attributes)?;
        let sets = columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING *",
            self.def.table(),
            sets.join(", "),
            self.def.key_name()
        );
        let key = display_value(&id);
        params.push(id);

        query_one(&self.db, &sql, &params, E::from_row)?
            .ok_or_else(|| DbError::not_found_key(self.def.model_name(), key))
    }

    /// Deletes every row whose primary key is in `ids`.
    pub fn destroy(&self, ids: impl IntoValues) -> Result<usize> {
        let ids = ids.into_values();
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            self.def.table(),
            self.def.key_name(),
            vec!["?"; ids.len()].join(", ")
        );
        execute(&self.db, &sql, &ids)
    }

    /// Total number of rows in the table.
    pub fn count(&self) -> Result<u64> {
        self.new_query().count()
    }
}

fn split_attributes(attributes: Attributes) -> Result<(Vec<Ident>, Vec<Value>)> {
    let mut columns = Vec::with_capacity(attributes.len());
    let mut values = Vec::with_capacity(attributes.len());
    for (column, value) in attributes {
        columns.push(Ident::parse(&column)?);
        values.push(value);
    }
    Ok((columns, values))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
