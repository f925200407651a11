//! The query builder.
//!
//! A [`Query`] is the query-construction context of one model: it collects
//! columns, conditions, ordering, a row window, eager loads and scopes, and
//! is consumed by a terminal method that runs it against the connection.
//!
//! # Submodules
//!
//! - `clause`: WHERE / ORDER BY fragments shared by reads and writes.
//! - [`builder`]: Implementation of [`Query`].
//! - `eager`: Relation loading after the parent rows are fetched.
//! - [`pagination`]: [`LengthAwarePage`].

pub(crate) mod clause;
pub mod builder;
pub(crate) mod eager;
pub mod pagination;

pub use builder::Query;
pub use pagination::LengthAwarePage;
