//! Path resolution for devstack
//!
//! # Environment Variables
//!
//! - `DEVSTACK_CONFIG` - Override the configuration file location
//!
//! # Config File Resolution Priority
//!
//! 1. `--config <FILE>` on the command line
//! 2. `DEVSTACK_CONFIG` environment variable
//! 3. `./devstack.toml` in the current directory
//! 4. `devstack/devstack.toml` in the user config directory, if it exists

use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "DEVSTACK_CONFIG";

/// Config file name looked up in the current directory
pub const CONFIG_FILE: &str = "devstack.toml";

/// Resolve the configuration file path
pub fn config_file(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        log::debug!("Using config file from --config: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(value) = std::env::var(ENV_CONFIG) {
        let path = expand(&value);
        log::debug!("Using config file from {}: {}", ENV_CONFIG, path.display());
        return path;
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }

    match user_config_file() {
        Some(path) if path.exists() => {
            log::debug!("Using user config file: {}", path.display());
            path
        }
        _ => local,
    }
}

/// `devstack.toml` under the platform config directory
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("devstack").join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// All modules should use this instead of calling shellexpand directly.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_explicit_config_wins() {
        with_env_var(ENV_CONFIG, "/from/env.toml", || {
            let path = config_file(Some(Path::new("/explicit.toml")));
            assert_eq!(path, PathBuf::from("/explicit.toml"));
        });
    }

    #[test]
    fn test_env_config_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CONFIG, "~/devstack-test/devstack.toml", || {
            assert_eq!(
                config_file(None),
                home.join("devstack-test").join("devstack.toml")
            );
        });
    }

    #[test]
    fn test_user_config_file_name() {
        if let Some(path) = user_config_file() {
            assert!(path.ends_with("devstack/devstack.toml"));
        }
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
