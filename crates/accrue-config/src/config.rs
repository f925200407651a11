use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    path::config_path,
};

pub const DEFAULT_PER_PAGE: u64 = 25;
pub const DEFAULT_PAGE_NAME: &str = "page";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Application's configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// SQLite database opened when no `--db` flag is given.
    pub database: Option<String>,

    /// Log level used when no verbosity flag is given.
    /// Default: info
    pub log_level: Option<String>,

    /// Defaults for paginated reads.
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PaginationConfig {
    /// Rows per page.
    /// Default: 25
    pub per_page: Option<u64>,

    /// Name of the request parameter the page number is read from.
    /// Default: page
    pub page_name: Option<String>,
}

/// Resolved pagination defaults handed to repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDefaults {
    pub per_page: u64,
    pub page_name: String,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            page_name: DEFAULT_PAGE_NAME.to_string(),
        }
    }
}

impl Config {
    /// Configuration with every default filled in.
    pub fn default_config() -> Self {
        Self {
            database: None,
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            pagination: PaginationConfig {
                per_page: Some(DEFAULT_PER_PAGE),
                page_name: Some(DEFAULT_PAGE_NAME.to_string()),
            },
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads and resolves the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded configuration");
                toml::from_str(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset fields with their defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        let per_page = *self.pagination.per_page.get_or_insert(DEFAULT_PER_PAGE);
        if per_page == 0 {
            return Err(ConfigError::InvalidPerPage(per_page));
        }

        let page_name = self
            .pagination
            .page_name
            .get_or_insert_with(|| DEFAULT_PAGE_NAME.to_string());
        if page_name.is_empty()
            || !page_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::InvalidPageName(page_name.clone()));
        }

        let log_level = self
            .log_level
            .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
        *log_level = log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(log_level.clone()));
        }

        Ok(())
    }

    pub fn pagination_defaults(&self) -> PageDefaults {
        PageDefaults {
            per_page: self.pagination.per_page.unwrap_or(DEFAULT_PER_PAGE),
            page_name: self
                .pagination
                .page_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PAGE_NAME.to_string()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Writes the default configuration to `path`, or to the configured
/// location when `path` is `None`.
pub fn generate_default_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let body = Config::default_config().to_toml()?;
    let document = format!(
        "# accrue configuration\n\
         #\n\
         # database: SQLite file opened when no --db flag is given.\n\
         # log_level: error, warn, info, debug or trace.\n\
         # pagination.per_page: rows per page (at least 1).\n\
         # pagination.page_name: parameter the page number is read from.\n\n\
         {body}"
    );

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, document)?;
    info!(
        "Default configuration file generated at: {}",
        config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::{path::CONFIG_ENV, test_utils::with_env};

    #[test]
    fn test_config_resolve_sets_defaults() {
        let mut config = Config::default();
        config.resolve().unwrap();

        assert_eq!(config, Config::default_config());
        assert_eq!(config.pagination_defaults(), PageDefaults::default());
    }

    #[test]
    fn test_config_resolve_rejects_invalid_values() {
        let mut config = Config::default();
        config.pagination.per_page = Some(0);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidPerPage(0))
        ));

        let mut config = Config::default();
        config.pagination.page_name = Some("pa ge".into());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidPageName(_))
        ));

        let mut config = Config::default();
        config.log_level = Some("loud".into());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_load_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "database = \"app.db\"\nlog_level = \"DEBUG\"\n\n[pagination]\nper_page = 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.as_deref(), Some("app.db"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(
            config.pagination_defaults(),
            PageDefaults {
                per_page: 10,
                page_name: "page".into()
            }
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "pagination = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::TomlDeError(_))
        ));
    }

    #[test]
    fn test_generate_default_config_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        generate_default_config(Some(&path)).unwrap();
        let generated = Config::load_from(&path).unwrap();
        assert_eq!(generated, Config::default_config());

        assert!(matches!(
            generate_default_config(Some(&path)),
            Err(ConfigError::ConfigAlreadyExists)
        ));
    }

    #[test]
    #[serial]
    fn test_new_reads_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accrue.toml");
        fs::write(&path, "[pagination]\npage_name = \"p\"\n").unwrap();

        with_env(vec![(CONFIG_ENV, path.to_str())], || {
            let config = Config::new().unwrap();
            assert_eq!(config.pagination_defaults().page_name, "p");
        });
    }
}
