//! Generic repositories with deferred, accumulated query constraints.
//!
//! A [`Repository`] wraps one model. Chained calls such as `where_`,
//! `order_by`, `limit`, `with` and `scope` only record constraints; a
//! terminal operation (`get`, `first`, `paginate`, `delete`, `pluck`, ...)
//! builds a fresh query, applies the subset of constraints it supports,
//! runs it, and leaves the repository with no pending constraints.

pub mod constraints;
pub mod repository;

pub use accrue_config::PageDefaults;
pub use constraints::{Constraints, Filter, IntoRelations, Ordering, ScopeCall, SetMembership};
pub use repository::{Plucked, Repository, UpdateOptions, ALL_COLUMNS};

#[cfg(test)]
mod tests;
