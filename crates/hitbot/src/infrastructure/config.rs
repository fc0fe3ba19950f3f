//! Loading the TOML config file from disk.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::config::BotConfig;

/// Error type for reading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content does not match the schema.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reads and parses the config at `path`.
///
/// Unlike most settings files a missing file is an error: the bot needs at
/// least a name.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not a valid config.
pub fn load_config(path: &Path) -> Result<BotConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_config_reads_file() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bot]\nname = \"mybot\"\nchannels = [\"general\"]").unwrap();

        // Act
        let cfg = load_config(file.path()).unwrap();

        // Assert
        assert_eq!(cfg.bot.name, "mybot");
        assert_eq!(cfg.bot.channels, vec!["general"]);
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Io { path: p, .. }) if p == path));
    }

    #[test]
    fn test_load_config_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
