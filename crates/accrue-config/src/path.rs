//! Location of the configuration file.

use std::{env, path::PathBuf};

/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV: &str = "ACCRUE_CONFIG";

/// Returns the user's home directory from `HOME`.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

/// Returns `XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".config"))
}

/// `$ACCRUE_CONFIG`, else `$XDG_CONFIG_HOME/accrue/config.toml`.
pub fn config_path() -> PathBuf {
    match env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => xdg_config_home().join("accrue").join("config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::test_utils::with_env;

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        with_env(vec![(CONFIG_ENV, Some("/custom/accrue.toml"))], || {
            assert_eq!(config_path(), PathBuf::from("/custom/accrue.toml"));
        });
    }

    #[test]
    #[serial]
    fn test_config_path_xdg() {
        with_env(
            vec![(CONFIG_ENV, None), ("XDG_CONFIG_HOME", Some("/xdg"))],
            || {
                assert_eq!(config_path(), PathBuf::from("/xdg/accrue/config.toml"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_config_path_home_fallback() {
        with_env(
            vec![
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", None),
                ("HOME", Some("/home/tester")),
            ],
            || {
                assert_eq!(
                    config_path(),
                    PathBuf::from("/home/tester/.config/accrue/config.toml")
                );
            },
        );
    }
}
