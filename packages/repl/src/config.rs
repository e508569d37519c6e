//! Shell configuration.
//!
//! Settings are layered: built-in defaults, then the JSON config file, then
//! `MODEFILE_*` environment variables. Command-line flags are applied last
//! by the binary.
//!
//! ```json
//! {
//!     "identifier_kind": "text",
//!     "default_encoding": "latin-1",
//!     "edit_mode": "vi",
//!     "history": false
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use modefile_core::{IdentifierKind, TextEncoding};
use serde::{Deserialize, Serialize};

pub const ENV_ID_KIND: &str = "MODEFILE_ID_KIND";
pub const ENV_ENCODING: &str = "MODEFILE_ENCODING";
pub const ENV_EDIT_MODE: &str = "MODEFILE_EDIT_MODE";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {variable}")]
    Env {
        variable: &'static str,
        value: String,
    },
}

/// Line editing style for the terminal host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    Vi,
    Emacs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Shape of the identifiers files are registered under.
    pub identifier_kind: IdentifierKind,
    /// Encoding new handles start with.
    pub default_encoding: TextEncoding,
    /// `None` detects the mode from `EDITOR`, `VISUAL` and `.inputrc`.
    pub edit_mode: Option<EditMode>,
    /// Keep command history between sessions.
    pub history: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            identifier_kind: IdentifierKind::Numeric,
            default_encoding: TextEncoding::Utf8,
            edit_mode: None,
            history: true,
        }
    }
}

impl ShellConfig {
    /// `<config dir>/modefile/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("modefile").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit`, or from [`default_path`](Self::default_path)
    /// when it exists, then apply the environment.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    log::debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override settings from `MODEFILE_*` variables found through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_ID_KIND) {
            self.identifier_kind =
                parse_identifier_kind(&value).ok_or(ConfigError::Env {
                    variable: ENV_ID_KIND,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_ENCODING) {
            self.default_encoding = value.parse().map_err(|_| ConfigError::Env {
                variable: ENV_ENCODING,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_EDIT_MODE) {
            self.edit_mode = Some(parse_edit_mode(&value).ok_or(ConfigError::Env {
                variable: ENV_EDIT_MODE,
                value,
            })?);
        }
        Ok(())
    }
}

pub fn parse_identifier_kind(value: &str) -> Option<IdentifierKind> {
    match value.trim().to_lowercase().as_str() {
        "numeric" | "number" | "int" => Some(IdentifierKind::Numeric),
        "text" | "string" | "str" => Some(IdentifierKind::Text),
        _ => None,
    }
}

fn parse_edit_mode(value: &str) -> Option<EditMode> {
    match value.trim().to_lowercase().as_str() {
        "vi" | "vim" => Some(EditMode::Vi),
        "emacs" => Some(EditMode::Emacs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.identifier_kind, IdentifierKind::Numeric);
        assert_eq!(config.default_encoding, TextEncoding::Utf8);
        assert!(config.history);
    }

    #[test]
    fn reads_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"identifier_kind": "text", "default_encoding": "latin-1"}"#,
        )
        .unwrap();

        let config = ShellConfig::from_file(&path).unwrap();
        assert_eq!(config.identifier_kind, IdentifierKind::Text);
        assert_eq!(config.default_encoding, TextEncoding::Latin1);
        assert_eq!(config.edit_mode, None);
        assert!(config.history);
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"colour": true}"#).unwrap();

        assert!(matches!(
            ShellConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ShellConfig::load(Some(&dir.path().join("nope.json"))),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = ShellConfig::default();
        config
            .apply_env(env(&[
                (ENV_ID_KIND, "string"),
                (ENV_ENCODING, "ascii"),
                (ENV_EDIT_MODE, "VI"),
            ]))
            .unwrap();

        assert_eq!(config.identifier_kind, IdentifierKind::Text);
        assert_eq!(config.default_encoding, TextEncoding::Ascii);
        assert_eq!(config.edit_mode, Some(EditMode::Vi));
    }

    #[test]
    fn bad_environment_value() {
        let mut config = ShellConfig::default();
        let result = config.apply_env(env(&[(ENV_ENCODING, "klingon")]));
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                variable: ENV_ENCODING,
                ..
            })
        ));
    }
}
