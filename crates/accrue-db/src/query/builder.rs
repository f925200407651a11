//! The query-construction context.

use std::{collections::HashMap, sync::Arc};

use rusqlite::types::Value;
use tracing::trace;

use crate::{
    connection::{execute, query_map, query_one, Db},
    error::{DbError, Result},
    expr::ops::{BinaryOp, InOp, NullOp},
    ident::{Direction, Ident, Operator},
    model::{ModelDef, Relation},
    query::{
        clause::{push_orders, push_wheres, OrderClause, WhereClause},
        eager::{self, Parent, RowKey},
        pagination::LengthAwarePage,
    },
    traits::{Entity, Expression},
    value::{display_value, IntoSqlValue, IntoValues},
};

/// A SELECT under construction against one model's table.
///
/// Obtained from [`crate::ModelHandle::new_query`] and consumed by one of
/// the terminal methods (`get`, `first`, `paginate`, `delete`, `pluck`, ...).
/// Methods that take caller-supplied identifiers validate them and return
/// a `Result`.
///
/// # Example
///
/// ```rust
/// use accrue_db::{ModelContainer, ModelDef, Operator, Direction, Record};
///
/// let mut container = ModelContainer::open_in_memory().unwrap();
/// container
///     .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
///     .unwrap();
/// container.register_def("users", ModelDef::new::<Record>("users")).unwrap();
///
/// let users = container.make::<Record>("users").unwrap();
/// let (sql, params) = users
///     .new_query()
///     .where_col("age", Operator::Gte, 18)
///     .unwrap()
///     .order_by("name", Direction::Desc)
///     .unwrap()
///     .take(10)
///     .to_sql();
///
/// assert_eq!(sql, "SELECT * FROM users WHERE age >= ? ORDER BY name DESC LIMIT 10");
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    db: Db,
    def: Arc<ModelDef>,
    columns: Vec<Ident>,
    eager: Vec<Relation>,
    wheres: Vec<WhereClause>,
    orders: Vec<OrderClause>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub(crate) fn new(db: Db, def: Arc<ModelDef>) -> Self {
        Self {
            db,
            def,
            columns: vec![],
            eager: vec![],
            wheres: vec![],
            orders: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn model(&self) -> &ModelDef {
        &self.def
    }

    /// Restricts the selected columns. `*` anywhere in the list selects
    /// every column.
    pub fn select<S: AsRef<str>>(mut self, columns: &[S]) -> Result<Self> {
        self.columns.clear();
        if columns.iter().any(|c| c.as_ref().trim() == "*") {
            return Ok(self);
        }
        for column in columns {
            self.columns.push(Ident::parse(column.as_ref())?);
        }
        Ok(self)
    }

    /// Eager loads a declared relation once the parent rows are fetched.
    pub fn with(mut self, relation: &str) -> Result<Self> {
        let relation = self.def.get_relation(relation)?.clone();
        if !self.eager.iter().any(|r| r.name == relation.name) {
            self.eager.push(relation);
        }
        Ok(self)
    }

    /// Adds `column <op> value`.
    ///
    /// Comparing against NULL with `=` or `!=` becomes `IS NULL` /
    /// `IS NOT NULL`.
    pub fn where_col(mut self, column: &str, op: Operator, value: impl IntoSqlValue) -> Result<Self> {
        let column = Ident::parse(column)?;
        let value = value.into_sql_value();

        let clause = match (op, &value) {
            (Operator::Eq, Value::Null) => WhereClause::from_expr(&NullOp::new(column, true)),
            (Operator::Ne, Value::Null) => WhereClause::from_expr(&NullOp::new(column, false)),
            _ => WhereClause::from_expr(&BinaryOp::new(column, op, value)),
        };
        self.wheres.push(clause);
        Ok(self)
    }

    /// Adds `column IN (values...)`. An empty list matches nothing.
    pub fn where_in(mut self, column: &str, values: impl IntoValues) -> Result<Self> {
        let column = Ident::parse(column)?;
        self.wheres.push(WhereClause::from_expr(&InOp::new(
            column,
            values.into_values(),
            false,
        )));
        Ok(self)
    }

    /// Adds a typed expression built from [`crate::expr::Col`].
    pub fn filter<X: Expression>(mut self, expr: X) -> Self {
        self.wheres.push(WhereClause::from_expr(&expr));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Result<Self> {
        self.orders.push(OrderClause {
            column: Ident::parse(column)?,
            direction,
        });
        Ok(self)
    }

    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Applies a scope registered on the model definition.
    pub fn scope(self, name: &str, args: &[Value]) -> Result<Self> {
        let scope = Arc::clone(self.def.get_scope(name)?);
        trace!(model = self.def.model_name(), scope = name, args = args.len(), "applying scope");
        scope(self, args)
    }

    /// Renders the SELECT this query would run.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        self.build_select(&self.select_list())
    }

    pub fn get<E: Entity>(self) -> Result<Vec<E>> {
        let (sql, params) = self.to_sql();
        if self.eager.is_empty() {
            return query_map(&self.db, &sql, &params, E::from_row);
        }

        let parents = query_map(&self.db, &sql, &params, |row| {
            let keys = self
                .eager
                .iter()
                .map(|r| row.get::<_, Value>(r.parent_key.as_str()))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Parent {
                entity: E::from_row(row)?,
                keys,
            })
        })?;
        eager::load(&self.db, &self.eager, parents)
    }

    pub fn first<E: Entity>(self) -> Result<Option<E>> {
        Ok(self.take(1).get()?.into_iter().next())
    }

    pub fn first_or_fail<E: Entity>(self) -> Result<E> {
        let model = self.def.model_name().to_string();
        self.first()?.ok_or_else(|| DbError::not_found(model))
    }

    /// Looks a row up by primary key, keeping any constraints already on
    /// the query.
    pub fn find<E: Entity>(self, id: impl IntoSqlValue) -> Result<Option<E>> {
        let key = self.def.key_name().to_string();
        self.where_col(&key, Operator::Eq, id)?.first()
    }

    pub fn find_or_fail<E: Entity>(self, id: impl IntoSqlValue) -> Result<E> {
        let id = id.into_sql_value();
        let model = self.def.model_name().to_string();
        let key = display_value(&id);
        self.find(id)?
            .ok_or_else(|| DbError::not_found_key(model, key))
    }

    /// Runs the query for one page.
    ///
    /// Any pending `take`/`skip` is replaced by the page window. The total is
    /// counted with the same conditions and no ordering. Pages below 1 are
    /// clamped to 1.
    pub fn paginate<E: Entity>(
        mut self,
        per_page: u64,
        page: u64,
        page_name: &str,
    ) -> Result<LengthAwarePage<E>> {
        if per_page == 0 {
            return Err(DbError::InvalidPagination(
                "per_page must be at least 1".to_string(),
            ));
        }
        let current_page = page.max(1);

        self.limit = None;
        self.offset = None;
        let total = self.count()?;
        let items = self
            .take(per_page)
            .skip((current_page - 1).saturating_mul(per_page))
            .get()?;

        Ok(LengthAwarePage {
            items,
            total,
            per_page,
            current_page,
            page_name: page_name.to_string(),
        })
    }

    /// Counts matching rows, ignoring ordering and any limit.
    pub fn count(&self) -> Result<u64> {
        let mut params = vec![];
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.def.table());
        push_wheres(&mut sql, &mut params, &self.wheres);

        let count = query_one(&self.db, &sql, &params, |row| row.get::<_, i64>(0))?;
        Ok(count.unwrap_or_default().max(0) as u64)
    }

    /// Deletes matching rows and returns how many were removed.
    ///
    /// Ordering and limits do not apply to deletes.
    pub fn delete(self) -> Result<usize> {
        let mut params = vec![];
        let mut sql = format!("DELETE FROM {}", self.def.table());
        push_wheres(&mut sql, &mut params, &self.wheres);

        execute(&self.db, &sql, &params)
    }

    /// Values of one column, in query order.
    pub fn pluck(self, column: &str) -> Result<Vec<Value>> {
        let column = Ident::parse(column)?;
        let (sql, params) = self.build_select(column.as_str());
        query_map(&self.db, &sql, &params, |row| row.get::<_, Value>(0))
    }

    /// `(key, value)` pairs of two columns.
    ///
    /// Keys keep their first-seen order; a repeated key overwrites the
    /// earlier value in place.
    pub fn pluck_keyed(self, column: &str, key: &str) -> Result<Vec<(Value, Value)>> {
        let column = Ident::parse(column)?;
        let key = Ident::parse(key)?;
        let (sql, params) = self.build_select(&format!("{}, {}", column, key));
        let rows = query_map(&self.db, &sql, &params, |row| {
            Ok((row.get::<_, Value>(1)?, row.get::<_, Value>(0)?))
        })?;

        let mut positions: HashMap<RowKey, usize> = HashMap::new();
        let mut pairs: Vec<(Value, Value)> = Vec::with_capacity(rows.len());
        for (key, value) in rows {
            match positions.get(&RowKey::from(&key)) {
                Some(&idx) => pairs[idx].1 = value,
                None => {
                    positions.insert(RowKey::from(&key), pairs.len());
                    pairs.push((key, value));
                }
            }
        }
        Ok(pairs)
    }

    fn select_list(&self) -> String {
        if self.columns.is_empty() {
            return "*".to_string();
        }

        let mut columns = self
            .columns
            .iter()
            .map(|c| c.as_str().to_string())
            .collect::<Vec<_>>();
        // Relations join on the parent key, so it must be selected.
        for relation in &self.eager {
            if !self.columns.iter().any(|c| c.column() == relation.parent_key) {
                columns.push(relation.parent_key.clone());
            }
        }
        columns.join(", ")
    }

    fn build_select(&self, select: &str) -> (String, Vec<Value>) {
        let mut params = vec![];
        let mut sql = format!("SELECT {} FROM {}", select, self.def.table());

        push_wheres(&mut sql, &mut params, &self.wheres);
        push_orders(&mut sql, &self.orders);

        match (self.limit.map(sql_integer), self.offset.map(sql_integer)) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        (sql, params)
    }
}

/// SQLite integers are signed; larger counts saturate at `i64::MAX`.
fn sql_integer(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
