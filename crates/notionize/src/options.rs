use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How tables are converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Tables become table blocks unless they are marked as databases.
    #[default]
    Page,
    /// Every table is projected onto a database schema.
    Database,
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "page" => Ok(ConversionMode::Page),
            "database" => Ok(ConversionMode::Database),
            _ => Err(format!("Unknown conversion mode: {s}")),
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionMode::Page => write!(f, "page"),
            ConversionMode::Database => write!(f, "database"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Destination database. Stamped into the output as its `parent`.
    pub database_id: Option<String>,
    pub mode: ConversionMode,
    /// Merge adjacent text objects with identical annotations in paragraphs and quotes.
    pub merge_adjacent_text: bool,
    /// Elements nested deeper than this are flattened to text.
    pub max_depth: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            database_id: None,
            mode: ConversionMode::Page,
            merge_adjacent_text: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
