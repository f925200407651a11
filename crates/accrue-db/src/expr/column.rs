//! Represents a typed database column.
//!
//! `Col<T>` ties a column name to a Rust type `T`. It implements
//! [`Expression`], so it can be used directly in filters and scopes.

use std::marker::PhantomData;

use rusqlite::types::Value;

use crate::traits::Expression;

/// A typed reference to a database column.
///
/// The type parameter `T` documents the expected Rust type of the column;
/// it is not checked at runtime.
///
/// # Example
///
/// ```rust
/// use accrue_db::expr::Col;
/// const NAME: Col<String> = Col::new("name");
/// assert_eq!(NAME.qualified("users"), "users.name");
/// ```
pub struct Col<T> {
    pub name: &'static str,
    _type: PhantomData<T>,
}

impl<T> Clone for Col<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Col<T> {}

impl<T> Col<T> {
    /// Creates a new column reference.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// Returns `table.column`.
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", table, self.name)
    }
}

impl<T> Expression for Col<T> {
    fn to_sql(&self, _params: &mut Vec<Value>) -> String {
        self.name.to_string()
    }
}
