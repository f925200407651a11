//! SQLite model layer for accrue repositories.
//!
//! - [`ModelDef`] describes a model: table, primary key, relations, scopes.
//! - [`ModelContainer`] resolves model names into live [`ModelHandle`]s.
//! - [`Query`] is the query-construction context a handle hands out.

pub mod connection;
pub mod container;
pub mod error;
pub mod expr;
pub mod ident;
pub mod macros;
pub mod model;
pub mod query;
pub mod record;
pub mod traits;
pub mod value;

pub use connection::Db;
pub use container::{ModelContainer, ModelHandle};
pub use error::{DbError, Result};
pub use ident::{Direction, Ident, Operator};
pub use model::{ModelDef, Relation, RelationKind, ScopeFn};
pub use query::{LengthAwarePage, Query};
pub use record::{Loaded, Record};
pub use traits::{Entity, FromRow, Model};
pub use value::{attributes, Attributes, IntoSqlValue, IntoValues, Value};
