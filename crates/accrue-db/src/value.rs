//! Conversions between Rust values and SQLite values.
//!
//! Everything bound into a statement goes through [`Value`], so filters,
//! set memberships and attribute maps can hold heterogeneous columns.

use std::collections::BTreeMap;

pub use rusqlite::types::Value;

/// Converts a Rust scalar into a bindable SQLite value.
pub trait IntoSqlValue {
    fn into_sql_value(self) -> Value;
}

macro_rules! impl_into_sql_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoSqlValue for $ty {
                fn into_sql_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

impl_into_sql_value!(i8, i16, i32, i64, u8, u16, u32, f32, f64, bool, String);

impl IntoSqlValue for Value {
    fn into_sql_value(self) -> Value {
        self
    }
}

impl IntoSqlValue for &Value {
    fn into_sql_value(self) -> Value {
        self.clone()
    }
}

impl IntoSqlValue for &str {
    fn into_sql_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoSqlValue for &String {
    fn into_sql_value(self) -> Value {
        Value::Text(self.clone())
    }
}

impl<T: IntoSqlValue> IntoSqlValue for Option<T> {
    fn into_sql_value(self) -> Value {
        self.map_or(Value::Null, IntoSqlValue::into_sql_value)
    }
}

/// Converts either one scalar or a collection of scalars into a value list.
///
/// A scalar becomes a single-element list, so `where_in("id", 5)` and
/// `where_in("id", [5])` build the same constraint.
pub trait IntoValues {
    fn into_values(self) -> Vec<Value>;
}

macro_rules! impl_scalar_into_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValues for $ty {
                fn into_values(self) -> Vec<Value> {
                    vec![self.into_sql_value()]
                }
            }
        )*
    };
}

impl_scalar_into_values!(i8, i16, i32, i64, u8, u16, u32, f32, f64, bool, String, &str, Value);

/// No values, e.g. the arguments of a scope that takes none.
impl IntoValues for () {
    fn into_values(self) -> Vec<Value> {
        vec![]
    }
}

impl<T: IntoSqlValue> IntoValues for Vec<T> {
    fn into_values(self) -> Vec<Value> {
        self.into_iter().map(IntoSqlValue::into_sql_value).collect()
    }
}

impl<T: IntoSqlValue + Clone> IntoValues for &[T] {
    fn into_values(self) -> Vec<Value> {
        self.iter().cloned().map(IntoSqlValue::into_sql_value).collect()
    }
}

impl<T: IntoSqlValue, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<Value> {
        self.into_iter().map(IntoSqlValue::into_sql_value).collect()
    }
}

/// Column to value mapping used by create and update.
///
/// Ordered by column name so generated statements are deterministic.
pub type Attributes = BTreeMap<String, Value>;

/// Builds an [`Attributes`] map from `(column, value)` pairs.
pub fn attributes<K, V, I>(pairs: I) -> Attributes
where
    K: Into<String>,
    V: IntoSqlValue,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into_sql_value()))
        .collect()
}

/// Renders a value as JSON for display and serialization.
pub fn to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Blob(bytes) => serde_json::Value::from(bytes.clone()),
    }
}

/// Renders a value as plain text, the way the SQLite shell would.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
