//! Bridge configuration types.
//!
//! [`BridgeConfig`] holds the few knobs the sender has.  It is a plain struct
//! with sensible defaults; hosts that want file-based settings can load it
//! from TOML:
//!
//! ```toml
//! # Yield to the scheduler after every 4 chunks of a data stream.
//! yield_every_chunks = 4
//! # Log a warning for single-shot byte arrays above 1 MiB.
//! max_byte_array_len = 1048576
//! ```
//!
//! Fields missing from the file keep their default value, so an empty file
//! is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime configuration for the sender.
///
/// Build this once and pass it to [`crate::application::IpcSender::new`].
///
/// # Example
///
/// ```rust
/// use webview_ipc_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.yield_every_chunks, 1);
/// assert_eq!(cfg.max_byte_array_len, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How many chunks a data stream emits before yielding to the scheduler.
    ///
    /// `1` yields between every chunk, which keeps the UI thread responsive
    /// on large payloads.  `0` disables yielding entirely.
    pub yield_every_chunks: usize,

    /// Advisory size limit for single-shot byte arrays.
    ///
    /// Larger buffers are still sent, but a warning is logged suggesting a
    /// data stream instead.  `None` disables the check.
    pub max_byte_array_len: Option<usize>,
}

impl Default for BridgeConfig {
    /// | Field              | Default |
    /// |--------------------|---------|
    /// | yield_every_chunks | 1       |
    /// | max_byte_array_len | None    |
    fn default() -> Self {
        Self {
            yield_every_chunks: 1,
            max_byte_array_len: None,
        }
    }
}

impl BridgeConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_yields_after_every_chunk() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.yield_every_chunks, 1);
    }

    #[test]
    fn test_default_has_no_byte_array_limit() {
        let cfg = BridgeConfig::default();
        assert!(cfg.max_byte_array_len.is_none());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        // Arrange / Act
        let cfg = BridgeConfig::from_toml_str("").unwrap();
        // Assert
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[test]
    fn test_toml_overrides_fields() {
        let cfg = BridgeConfig::from_toml_str(
            "yield_every_chunks = 8\nmax_byte_array_len = 65536\n",
        )
        .unwrap();
        assert_eq!(cfg.yield_every_chunks, 8);
        assert_eq!(cfg.max_byte_array_len, Some(65536));
    }

    #[test]
    fn test_toml_with_wrong_type_is_a_parse_error() {
        let result = BridgeConfig::from_toml_str("yield_every_chunks = \"often\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let path = std::env::temp_dir().join("webview-ipc-bridge-does-not-exist.toml");

        let result = BridgeConfig::load(&path);

        match result {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!(
            "webview-ipc-bridge-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "yield_every_chunks = 0\n").unwrap();

        // Act
        let cfg = BridgeConfig::load(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(cfg.unwrap().yield_every_chunks, 0);
    }
}
