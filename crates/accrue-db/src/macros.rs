//! Macros for declaring table columns.
//!
//! The [`define_entity!`] macro generates column constants for a table,
//! tying database column names to Rust types so scopes and filters can use
//! [`crate::expr::Col`] instead of strings.

/// Defines a module with typed column constants for a database table.
///
/// # Syntax
///
/// ```rust
/// use accrue_db::define_entity;
/// use accrue_db::traits::Expression as _;
///
/// define_entity!(
///     users {
///         table: "users",
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name",
///             EMAIL: Option<String> => "email"
///         }
///     }
/// );
///
/// assert_eq!(users::TABLE, "users");
/// let mut params = vec![];
/// assert_eq!(users::EMAIL.not_null().to_sql(&mut params), "email IS NOT NULL");
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod users {
///     pub const TABLE: &str = "users";
///     pub const ID: accrue_db::expr::Col<i64> = accrue_db::expr::Col::new("id");
///     pub const NAME: accrue_db::expr::Col<String> = accrue_db::expr::Col::new("name");
///     pub const EMAIL: accrue_db::expr::Col<Option<String>> = accrue_db::expr::Col::new("email");
/// }
/// ```
#[macro_export]
macro_rules! define_entity {
    (
        $entity:ident {
            table: $table:literal,
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            }
        }
    ) => {
        pub mod $entity {
            #[allow(unused_imports)]
            use $crate::expr::column::Col;

            pub const TABLE: &str = $table;

            $(
                pub const $col_name: Col<$col_type> = Col::new($db_col);
            )*
        }
    };
}
