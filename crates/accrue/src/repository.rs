//! The constraint-accumulating repository.

use std::{fmt, marker::PhantomData, mem};

use accrue_config::PageDefaults;
use accrue_db::{
    Attributes, DbError, Entity, IntoSqlValue, IntoValues, LengthAwarePage, Model,
    ModelContainer, ModelHandle, Operator, Query, Result, Value,
};
use tracing::{debug, trace};

use crate::constraints::{Constraints, Filter, IntoRelations, Ordering, SetMembership};

/// Select every column.
pub const ALL_COLUMNS: &[&str] = &["*"];

/// Options for [`Repository::update_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Refresh `updated_at` on timestamped models.
    pub touch: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            touch: true,
        }
    }
}

/// Result of [`Repository::pluck`].
#[derive(Debug, Clone, PartialEq)]
pub enum Plucked {
    /// One value per row, in query order.
    Values(Vec<Value>),
    /// `(key, value)` pairs in first-seen key order; later rows with the
    /// same key overwrite the value.
    Keyed(Vec<(Value, Value)>),
}

impl Plucked {
    /// The plucked values without their keys.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Values(values) => values,
            Self::Keyed(pairs) => pairs.into_iter().map(|(_, v)| v).collect(),
        }
    }
}

type PageResolver = Box<dyn Fn(&str) -> Option<u64>>;

/// A repository over one model.
///
/// Fluent methods record constraints and return the repository for
/// chaining. Nothing touches the database until a terminal operation runs;
/// each terminal operation applies its own subset of the pending
/// constraints and leaves the repository with none, whether it succeeds or
/// fails.
///
/// A repository needs `&mut` access to chain, so one instance serves one
/// unit of work at a time.
///
/// # Example
///
/// ```rust
/// use accrue::{Repository, ALL_COLUMNS};
/// use accrue_db::{attributes, ModelContainer, ModelDef, Record};
///
/// let mut container = ModelContainer::open_in_memory().unwrap();
/// container
///     .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
///     .unwrap();
/// container.register_def("users", ModelDef::new::<Record>("users")).unwrap();
///
/// let mut users = Repository::<Record>::for_model(&container, "users").unwrap();
/// users.create(attributes([("name", "ada")])).unwrap();
/// users.create(attributes([("name", "grace")])).unwrap();
///
/// let found = users
///     .where_op("name", "like", "g%")
///     .order_by("id", "desc")
///     .limit(5)
///     .get(ALL_COLUMNS)
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// assert!(users.pending().is_empty());
/// ```
pub struct Repository<E: Entity> {
    model: ModelHandle,
    pending: Constraints,
    page_defaults: PageDefaults,
    page_resolver: Option<PageResolver>,
    _entity: PhantomData<fn() -> E>,
}

impl<M: Model> Repository<M> {
    /// Builds a repository for a statically bound model.
    pub fn new(container: &ModelContainer) -> Result<Self> {
        Self::for_model(container, M::NAME)
    }
}

impl<E: Entity> Repository<E> {
    /// Builds a repository for the model bound to `name`.
    pub fn for_model(container: &ModelContainer, name: &str) -> Result<Self> {
        let model = container.make::<E>(name)?;
        debug!(model = name, "repository ready");
        Ok(Self {
            model,
            pending: Constraints::default(),
            page_defaults: PageDefaults::default(),
            page_resolver: None,
            _entity: PhantomData,
        })
    }

    /// Replaces the defaults `paginate` uses when `per_page` or `page_name`
    /// is not given.
    pub fn with_page_defaults(mut self, defaults: PageDefaults) -> Self {
        self.page_defaults = defaults;
        self
    }

    /// Sets where `paginate` reads the current page from when none is
    /// passed. The resolver receives the page name.
    pub fn resolve_pages_with<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<u64> + 'static,
    {
        self.page_resolver = Some(Box::new(resolver));
        self
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Constraints recorded since the last terminal operation.
    pub fn pending(&self) -> &Constraints {
        &self.pending
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        trace!(limit, "pending limit");
        self.pending.limit = Some(limit);
        self
    }

    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        trace!(column, direction, "pending order");
        self.pending.orderings.push(Ordering {
            column: column.to_string(),
            direction: direction.to_string(),
        });
        self
    }

    pub fn order_by_asc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, "asc")
    }

    /// `column = value`.
    pub fn where_(&mut self, column: &str, value: impl IntoSqlValue) -> &mut Self {
        self.where_op(column, "=", value)
    }

    pub fn where_op(&mut self, column: &str, operator: &str, value: impl IntoSqlValue) -> &mut Self {
        trace!(column, operator, "pending filter");
        self.pending.filters.push(Filter {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into_sql_value(),
        });
        self
    }

    /// `column IN (values...)`. A single value is treated as a one-element
    /// list.
    pub fn where_in(&mut self, column: &str, values: impl IntoValues) -> &mut Self {
        let values = values.into_values();
        trace!(column, values = values.len(), "pending set membership");
        self.pending.set_memberships.push(SetMembership {
            column: column.to_string(),
            values,
        });
        self
    }

    /// Relations to eager load. Replaces any earlier list.
    pub fn with(&mut self, relations: impl IntoRelations) -> &mut Self {
        self.pending.eager_loads = relations.into_relations();
        trace!(relations = ?self.pending.eager_loads, "pending eager loads");
        self
    }

    /// Records a call to a scope registered on the model. Calling the same
    /// scope again replaces its arguments.
    pub fn scope(&mut self, name: &str, args: impl IntoValues) -> &mut Self {
        let args = args.into_values();
        trace!(scope = name, args = args.len(), "pending scope");
        self.pending.push_scope(name.to_string(), args);
        self
    }

    /// Every row, with pending eager loads. Other pending constraints are
    /// discarded.
    pub fn all(&mut self, columns: &[&str]) -> Result<Vec<E>> {
        let pending = self.drain("all");
        let query = pending.apply_eager_loads(self.model.new_query())?;
        query.select(columns)?.get()
    }

    /// Rows matching every pending constraint.
    pub fn get(&mut self, columns: &[&str]) -> Result<Vec<E>> {
        let pending = self.drain("get");
        self.full_query(&pending, true)?.select(columns)?.get()
    }

    /// The first row matching every pending constraint.
    pub fn first(&mut self, columns: &[&str]) -> Result<E> {
        let pending = self.drain("first");
        self.full_query(&pending, true)?
            .select(columns)?
            .first_or_fail()
    }

    /// Looks a row up by primary key alone.
    ///
    /// Pending filters, orderings, limit and scopes are discarded first;
    /// only pending eager loads apply.
    pub fn get_by_id(&mut self, id: impl IntoSqlValue, columns: &[&str]) -> Result<E> {
        let pending = self.drain("get_by_id");
        pending
            .apply_eager_loads(self.model.new_query())?
            .select(columns)?
            .find_or_fail(id)
    }

    /// The first row where `column = item`, if any.
    ///
    /// Pending constraints other than eager loads are discarded first.
    pub fn get_by_column(
        &mut self,
        item: impl IntoSqlValue,
        column: &str,
        columns: &[&str],
    ) -> Result<Option<E>> {
        let pending = self.drain("get_by_column");
        pending
            .apply_eager_loads(self.model.new_query())?
            .where_col(column, Operator::Eq, item)?
            .select(columns)?
            .first()
    }

    /// One page of rows matching the pending constraints.
    ///
    /// A pending `limit` is ignored; the page window decides which rows are
    /// returned. `per_page` and `page_name` fall back to the repository's
    /// page defaults. Without an explicit `page`, the page resolver is
    /// asked, then page 1 is used.
    pub fn paginate(
        &mut self,
        per_page: Option<u64>,
        columns: &[&str],
        page_name: Option<&str>,
        page: Option<u64>,
    ) -> Result<LengthAwarePage<E>> {
        let pending = self.drain("paginate");
        let per_page = per_page.unwrap_or(self.page_defaults.per_page);
        let page_name = page_name.unwrap_or(self.page_defaults.page_name.as_str());
        let page = page
            .or_else(|| self.page_resolver.as_ref().and_then(|r| r(page_name)))
            .unwrap_or(1);

        self.full_query(&pending, false)?
            .select(columns)?
            .paginate(per_page, page, page_name)
    }

    pub fn create(&mut self, data: Attributes) -> Result<E> {
        self.drain("create");
        self.model.create(data)
    }

    /// Creates one row per element, in order.
    ///
    /// Not atomic: rows created before a failing element stay committed.
    pub fn create_multiple<I>(&mut self, data: I) -> Result<Vec<E>>
    where
        I: IntoIterator<Item = Attributes>,
    {
        data.into_iter().map(|d| self.create(d)).collect()
    }

    /// Deletes rows matching the pending filters, set memberships and
    /// scopes. Eager loads, orderings and limit do not apply.
    pub fn delete(&mut self) -> Result<usize> {
        let pending = self.drain("delete");
        let query = pending.apply_conditions(self.model.new_query())?;
        pending.apply_scopes(query)?.delete()
    }

    /// Deletes one row by primary key.
    pub fn delete_by_id(&mut self, id: impl IntoSqlValue) -> Result<bool> {
        self.drain("delete_by_id");
        let id = id.into_sql_value();
        let key = self.model.definition().key_name().to_string();

        let exists = self
            .model
            .new_query()
            .where_col(&key, Operator::Eq, id.clone())?
            .count()?;
        if exists == 0 {
            return Err(DbError::not_found_key(
                self.model.definition().model_name(),
                accrue_db::value::display_value(&id),
            ));
        }

        self.model
            .new_query()
            .where_col(&key, Operator::Eq, id)?
            .delete()?;
        Ok(true)
    }

    /// Deletes every row whose primary key is in `ids`. Pending constraints
    /// are left untouched.
    pub fn delete_multiple_by_id(&self, ids: impl IntoValues) -> Result<usize> {
        self.model.destroy(ids)
    }

    /// Updates one row by primary key and returns it as stored.
    pub fn update_by_id(
        &mut self,
        id: impl IntoSqlValue,
        data: Attributes,
        options: UpdateOptions,
    ) -> Result<E> {
        self.drain("update_by_id");
        self.model.update_by_key(id, data, options.touch)
    }

    /// Total rows in the table. Pending constraints are neither applied nor
    /// cleared.
    pub fn count(&self) -> Result<u64> {
        self.model.count()
    }

    /// Values of `column`, keyed by `key` when given. No pending constraint
    /// applies.
    pub fn pluck(&mut self, column: &str, key: Option<&str>) -> Result<Plucked> {
        self.drain("pluck");
        let query = self.model.new_query();
        match key {
            Some(key) => Ok(Plucked::Keyed(query.pluck_keyed(column, key)?)),
            None => Ok(Plucked::Values(query.pluck(column)?)),
        }
    }

    /// Takes the pending constraints, leaving none behind.
    fn drain(&mut self, operation: &str) -> Constraints {
        let pending = mem::take(&mut self.pending);
        debug!(
            model = self.model.definition().model_name(),
            operation,
            eager_loads = pending.eager_loads.len(),
            filters = pending.filters.len(),
            set_memberships = pending.set_memberships.len(),
            orderings = pending.orderings.len(),
            limit = ?pending.limit,
            scopes = pending.scope_calls.len(),
            "flushing constraints"
        );
        pending
    }

    /// Fresh query with eager loads, conditions, orderings, optionally the
    /// limit, then scopes.
    fn full_query(&self, pending: &Constraints, with_limit: bool) -> Result<Query> {
        let query = pending.apply_eager_loads(self.model.new_query())?;
        let query = pending.apply_conditions(query)?;
        let mut query = pending.apply_orderings(query)?;
        if with_limit {
            query = pending.apply_limit(query);
        }
        pending.apply_scopes(query)
    }
}

impl<E: Entity> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("model", &self.model.definition().model_name())
            .field("pending", &self.pending)
            .field("page_defaults", &self.page_defaults)
            .finish_non_exhaustive()
    }
}
