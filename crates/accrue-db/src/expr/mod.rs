//! Expression types for building SQL conditions.
//!
//! This module contains the building blocks of typed query filters. The
//! repository's string-based constraints are validated into the same
//! fragments, so both paths bind values the same way.

pub mod column;
pub mod ops;

pub use column::Col;
