//! Configuration loading for the CLI.

use std::io;
use std::path::{Path, PathBuf};

use dispatch_bus::{ConfigError, CoreConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config in {path}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Load a JSON config file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<CoreConfig, SettingsError> {
    let Some(path) = path else {
        return Ok(CoreConfig::default());
    };
    let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CoreConfig::from_json_str(&json).map_err(|source| SettingsError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_bus::FailureScope;

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_reads_file() {
        let path = std::env::temp_dir().join(format!("data-loader-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "tracker": { "failure_scope": "channel" }, "dispatcher": { "timeout_ms": 250 } }"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.tracker.failure_scope, FailureScope::Channel);
        assert_eq!(config.dispatcher.timeout_ms, Some(250));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Some(Path::new("/nonexistent/data-loader.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
