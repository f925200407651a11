pub mod config;
pub mod error;
pub mod path;

pub use config::{generate_default_config, Config, PageDefaults, PaginationConfig};
pub use error::{ConfigError, Result};

#[cfg(test)]
pub mod test_utils;
