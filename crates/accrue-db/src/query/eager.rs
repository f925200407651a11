//! Eager loading of declared relations.
//!
//! Parents are fetched first. Then, for each requested relation, one
//! `SELECT * FROM related WHERE related_key IN (...)` collects every related
//! row, and the rows are grouped back onto their parents by key.

use std::collections::{HashMap, HashSet};

use rusqlite::types::Value;
use tracing::debug;

use crate::{
    connection::{query_map, Db},
    error::Result,
    ident::Ident,
    model::Relation,
    record::{Loaded, Record},
    traits::{Entity, FromRow},
};

/// Hashable form of a key value.
///
/// Integral reals collapse onto integers so `1` and `1.0` group together,
/// matching SQLite's comparison of numeric keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RowKey {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<&Value> for RowKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(i) => Self::Integer(*i),
            Value::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Self::Integer(*f as i64)
            }
            Value::Real(f) => Self::Real(f.to_bits()),
            Value::Text(s) => Self::Text(s.clone()),
            Value::Blob(b) => Self::Blob(b.clone()),
        }
    }
}

/// A parent entity together with the key values its relations join on.
pub(crate) struct Parent<E> {
    pub entity: E,
    pub keys: Vec<Value>,
}

/// Loads `relations` and attaches them to every parent.
pub(crate) fn load<E: Entity>(
    db: &Db,
    relations: &[Relation],
    parents: Vec<Parent<E>>,
) -> Result<Vec<E>> {
    let mut parents = parents;

    for (idx, relation) in relations.iter().enumerate() {
        let table = Ident::parse(&relation.related_table)?;
        let related_key = Ident::parse(&relation.related_key)?;

        let mut seen = HashSet::new();
        let mut candidates = vec![];
        for parent in &parents {
            let key = &parent.keys[idx];
            if *key != Value::Null && seen.insert(RowKey::from(key)) {
                candidates.push(key.clone());
            }
        }

        let mut grouped: HashMap<RowKey, Vec<Record>> = HashMap::new();
        if !candidates.is_empty() {
            let sql = format!(
                "SELECT * FROM {} WHERE {} IN ({})",
                table,
                related_key,
                vec!["?"; candidates.len()].join(", ")
            );
            let related = query_map(db, &sql, &candidates, Record::from_row)?;
            debug!(
                relation = relation.name,
                parents = parents.len(),
                rows = related.len(),
                "eager loaded relation"
            );

            for record in related {
                let key = record
                    .value(related_key.column())
                    .map(RowKey::from)
                    .unwrap_or(RowKey::Null);
                grouped.entry(key).or_default().push(record);
            }
        }

        for parent in &mut parents {
            let rows = grouped
                .get(&RowKey::from(&parent.keys[idx]))
                .cloned()
                .unwrap_or_default();
            let loaded = if relation.is_single() {
                Loaded::One(rows.into_iter().next())
            } else {
                Loaded::Many(rows)
            };
            parent.entity.set_relation(&relation.name, loaded);
        }
    }

    Ok(parents.into_iter().map(|p| p.entity).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_key_collapses_integral_reals() {
        assert_eq!(RowKey::from(&Value::Real(3.0)), RowKey::Integer(3));
        assert_ne!(RowKey::from(&Value::Real(3.5)), RowKey::Integer(3));
        assert_ne!(
            RowKey::from(&Value::Text("3".into())),
            RowKey::from(&Value::Integer(3))
        );
    }
}
