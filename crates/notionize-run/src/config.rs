use miette::Diagnostic;
use notionize::{ConversionMode, ConversionOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {}", path.display())]
    #[diagnostic(code(notionize::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}", path.display())]
    #[diagnostic(
        code(notionize::config::parse),
        help("Expected [notion] database_id and [conversion] mode / merge_adjacent_text / max_depth.")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotionConfig {
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub mode: Option<ConversionMode>,
    pub merge_adjacent_text: Option<bool>,
    pub max_depth: Option<usize>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub notion: NotionConfig,
    pub conversion: ConversionConfig,
}

/// `$NOTIONIZE_CONFIG_DIR`, else the platform config directory.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("NOTIONIZE_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("notionize")))
}

impl Config {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Loads `explicit` if given, otherwise the default file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        match config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::read(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Fills `options` with every value set in the file.
    pub fn apply(&self, options: &mut ConversionOptions) {
        if let Some(database_id) = &self.notion.database_id {
            options.database_id = Some(database_id.clone());
        }
        if let Some(mode) = self.conversion.mode {
            options.mode = mode;
        }
        if let Some(merge) = self.conversion.merge_adjacent_text {
            options.merge_adjacent_text = merge;
        }
        if let Some(max_depth) = self.conversion.max_depth {
            options.max_depth = max_depth;
        }
    }
}
