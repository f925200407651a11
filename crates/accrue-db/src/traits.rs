//! Row hydration, entity and model contracts, and the expression DSL.

use rusqlite::Row;

use crate::{
    expr::ops::{BinaryOp, InOp, LikeOp, LogicalOp, NullOp},
    ident::Operator,
    model::ModelDef,
    record::Loaded,
    value::{IntoSqlValue, IntoValues, Value},
};

/// A SQL fragment with `?` placeholders.
///
/// Column references, comparisons and their `AND`/`OR` combinations all
/// implement it, so a [`crate::Query::filter`] argument can be built up
/// from [`crate::expr::Col`] constants:
///
/// ```rust
/// use accrue_db::expr::Col;
/// use accrue_db::traits::Expression as _;
///
/// const AGE: Col<i64> = Col::new("age");
/// const NAME: Col<String> = Col::new("name");
///
/// let mut params = vec![];
/// let sql = AGE.gte(18).or(NAME.null()).to_sql(&mut params);
/// assert_eq!(sql, "(age >= ? OR name IS NULL)");
/// assert_eq!(params.len(), 1);
/// ```
pub trait Expression: Sized {
    /// Renders the fragment, appending its bound values to `params` in
    /// placeholder order.
    fn to_sql(&self, params: &mut Vec<Value>) -> String;

    fn compare<T: IntoSqlValue>(self, op: Operator, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, op, value.into_sql_value())
    }

    fn eq<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Eq, value)
    }

    fn ne<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Ne, value)
    }

    fn gt<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Gt, value)
    }

    fn lt<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Lt, value)
    }

    fn gte<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Gte, value)
    }

    fn lte<T: IntoSqlValue>(self, value: T) -> BinaryOp<Self> {
        self.compare(Operator::Lte, value)
    }

    /// Substring match: `pattern` is wrapped in `%`.
    fn like(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), false)
    }

    /// Case-insensitive substring match.
    fn ilike(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), true)
    }

    fn in_<V: IntoValues>(self, values: V) -> InOp<Self> {
        InOp::new(self, values.into_values(), false)
    }

    fn not_in<V: IntoValues>(self, values: V) -> InOp<Self> {
        InOp::new(self, values.into_values(), true)
    }

    fn null(self) -> NullOp<Self> {
        NullOp::new(self, true)
    }

    fn not_null(self) -> NullOp<Self> {
        NullOp::new(self, false)
    }

    fn and<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "AND")
    }

    fn or<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "OR")
    }
}

/// A trait for types that can be constructed from a SQLite row.
///
/// # Example
///
/// ```rust
/// use accrue_db::FromRow;
/// struct User {
///     id: i64,
///     name: String
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
///         Ok(User {
///             id: row.get("id")?,
///             name: row.get("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Anything a query can hydrate.
pub trait Entity: FromRow + 'static {
    /// Receives a relation loaded by `with(...)`.
    ///
    /// Entities that expose no relations can keep the default, which drops
    /// the payload.
    fn set_relation(&mut self, _relation: &str, _loaded: Loaded) {}
}

/// An entity bound to one model definition at compile time.
pub trait Model: Entity {
    /// Container key the repository resolves into a live model handle.
    const NAME: &'static str;

    /// Static metadata of this model: table, keys, relations and scopes.
    fn definition() -> ModelDef;
}
