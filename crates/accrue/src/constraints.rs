//! Pending constraint state.
//!
//! Constraints are stored as plain data while a repository chain is being
//! built. Strings are parsed into identifiers, operators and directions only
//! when they are applied to a [`Query`], so a bad column name surfaces from
//! the terminal operation that flushes it.

use accrue_db::{Direction, Operator, Query, Result, Value};

/// `column <operator> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

/// `column IN (values...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetMembership {
    pub column: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub direction: String,
}

/// A recorded named-scope invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeCall {
    pub name: String,
    pub args: Vec<Value>,
}

/// Everything chained on a repository since its last terminal operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub eager_loads: Vec<String>,
    pub filters: Vec<Filter>,
    pub set_memberships: Vec<SetMembership>,
    pub orderings: Vec<Ordering>,
    pub limit: Option<u64>,
    pub scope_calls: Vec<ScopeCall>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Records a scope call. Calling the same scope again replaces its
    /// arguments but keeps its original position.
    pub fn push_scope(&mut self, name: String, args: Vec<Value>) {
        match self.scope_calls.iter_mut().find(|call| call.name == name) {
            Some(call) => call.args = args,
            None => {
                self.scope_calls.push(ScopeCall {
                    name,
                    args,
                })
            }
        }
    }

    pub(crate) fn apply_eager_loads(&self, mut query: Query) -> Result<Query> {
        for relation in &self.eager_loads {
            query = query.with(relation)?;
        }
        Ok(query)
    }

    /// Applies filters and set memberships.
    pub(crate) fn apply_conditions(&self, mut query: Query) -> Result<Query> {
        for filter in &self.filters {
            let operator: Operator = filter.operator.parse()?;
            query = query.where_col(&filter.column, operator, filter.value.clone())?;
        }
        for membership in &self.set_memberships {
            query = query.where_in(&membership.column, membership.values.clone())?;
        }
        Ok(query)
    }

    pub(crate) fn apply_orderings(&self, mut query: Query) -> Result<Query> {
        for ordering in &self.orderings {
            let direction: Direction = ordering.direction.parse()?;
            query = query.order_by(&ordering.column, direction)?;
        }
        Ok(query)
    }

    pub(crate) fn apply_limit(&self, query: Query) -> Query {
        match self.limit {
            Some(limit) => query.take(limit),
            None => query,
        }
    }

    pub(crate) fn apply_scopes(&self, mut query: Query) -> Result<Query> {
        for call in &self.scope_calls {
            query = query.scope(&call.name, &call.args)?;
        }
        Ok(query)
    }
}

/// Relation names accepted by `with`: one name or a list.
pub trait IntoRelations {
    fn into_relations(self) -> Vec<String>;
}

impl IntoRelations for &str {
    fn into_relations(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoRelations for String {
    fn into_relations(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: AsRef<str>> IntoRelations for Vec<S> {
    fn into_relations(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoRelations for &[S] {
    fn into_relations(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoRelations for [S; N] {
    fn into_relations(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}
