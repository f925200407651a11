//! Dynamically typed rows.

use std::collections::BTreeMap;

use rusqlite::{types::FromSql, Row};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    traits::{Entity, FromRow},
    value::{to_json_value, Value},
};

/// Relation payload handed to an entity by eager loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// `has_one` / `belongs_to`: the related row, if any.
    One(Option<Record>),
    /// `has_many`: every related row, in database order.
    Many(Vec<Record>),
}

impl Loaded {
    pub fn len(&self) -> usize {
        match self {
            Self::One(one) => usize::from(one.is_some()),
            Self::Many(many) => many.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the payload into a list of rows.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::One(one) => one.into_iter().collect(),
            Self::Many(many) => many,
        }
    }
}

/// A row whose shape is only known at runtime.
///
/// Columns keep the order of the SELECT list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
    relations: BTreeMap<String, Loaded>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing its value if present.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.columns.iter().position(|c| *c == column) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Reads a column as a Rust type.
    ///
    /// Returns `None` when the column is missing or the value does not
    /// convert to `T`.
    pub fn get<T: FromSql>(&self, column: &str) -> Option<T> {
        let value = self.value(column)?;
        T::column_result(value.into()).ok()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn relation(&self, name: &str) -> Option<&Loaded> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Loaded> {
        &self.relations
    }
}

impl FromRow for Record {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let stmt = row.as_ref();
        let count = stmt.column_count();
        let mut record = Record {
            columns: Vec::with_capacity(count),
            values: Vec::with_capacity(count),
            relations: BTreeMap::new(),
        };
        for idx in 0..count {
            record.columns.push(stmt.column_name(idx)?.to_string());
            record.values.push(row.get::<_, Value>(idx)?);
        }
        Ok(record)
    }
}

impl Entity for Record {
    fn set_relation(&mut self, relation: &str, loaded: Loaded) {
        self.relations.insert(relation.to_string(), loaded);
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + self.relations.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &to_json_value(value))?;
        }
        for (name, loaded) in &self.relations {
            match loaded {
                Loaded::One(one) => map.serialize_entry(name, one)?,
                Loaded::Many(many) => map.serialize_entry(name, many)?,
            }
        }
        map.end()
    }
}
