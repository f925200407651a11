//! Internal representation of query clauses.
//!
//! These types are used by [`super::Query`] and the write helpers of
//! [`crate::ModelHandle`]; they are not part of the public API.

use rusqlite::types::Value;

use crate::{
    ident::{Direction, Ident},
    traits::Expression,
};

/// A rendered WHERE condition with its bound parameters.
///
/// Conditions are rendered once, when registered, so a query can emit the
/// same clause into both its row and count statements.
#[derive(Debug, Clone)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    pub fn from_expr<E: Expression>(expr: &E) -> Self {
        let mut params = vec![];
        let sql = expr.to_sql(&mut params);
        Self {
            sql,
            params,
        }
    }
}

/// An ORDER BY clause.
#[derive(Debug, Clone)]
pub(crate) struct OrderClause {
    pub column: Ident,
    pub direction: Direction,
}

/// Appends ` WHERE a AND b ...` and the bound values, if any.
pub(crate) fn push_wheres(sql: &mut String, params: &mut Vec<Value>, wheres: &[WhereClause]) {
    if wheres.is_empty() {
        return;
    }

    sql.push_str(" WHERE ");
    let conditions = wheres
        .iter()
        .map(|w| {
            params.extend(w.params.iter().cloned());
            w.sql.as_str()
        })
        .collect::<Vec<_>>();
    sql.push_str(&conditions.join(" AND "));
}

pub(crate) fn push_orders(sql: &mut String, orders: &[OrderClause]) {
    if orders.is_empty() {
        return;
    }

    sql.push_str(" ORDER BY ");
    let orders = orders
        .iter()
        .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
        .collect::<Vec<_>>();
    sql.push_str(&orders.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Col;

    #[test]
    fn test_push_wheres_joins_with_and() {
        let wheres = vec![
            WhereClause::from_expr(&Col::<i64>::new("age").gt(18)),
            WhereClause::from_expr(&Col::<String>::new("name").ne("root")),
        ];
        let mut sql = "SELECT * FROM users".to_string();
        let mut params = vec![];
        push_wheres(&mut sql, &mut params, &wheres);

        assert_eq!(sql, "SELECT * FROM users WHERE age > ? AND name != ?");
        assert_eq!(params, vec![Value::Integer(18), Value::Text("root".into())]);
    }

    #[test]
    fn test_push_nothing_when_empty() {
        let mut sql = "SELECT * FROM users".to_string();
        let mut params = vec![];
        push_wheres(&mut sql, &mut params, &[]);
        push_orders(&mut sql, &[]);
        assert_eq!(sql, "SELECT * FROM users");
    }
}
