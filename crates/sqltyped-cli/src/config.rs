//! Configuration file handling

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use sqltyped_core::GenerateSettings;

use crate::args::OutputFormat;

pub const CONFIG_FILE: &str = "sqltyped.toml";

/// Configuration for sqltyped
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Schema file paths
    #[serde(default)]
    pub schema: Vec<String>,

    /// Schema directory; every `*.sql` file below it is loaded
    pub schema_dir: Option<String>,

    /// Query file paths or glob patterns
    #[serde(default)]
    pub queries: Vec<String>,

    /// SQL dialect ("postgresql" or "mysql")
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (human, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Override the dialect's placeholder style
    #[serde(default)]
    pub positional_parameters: Option<bool>,

    /// Code generation settings
    #[serde(default, rename = "gen")]
    pub generate: GenerateSettings,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load sqltyped.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let current_dir = std::env::current_dir().into_diagnostic()?;
        match find_config(&current_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Ok(Some(Self::from_file(&path)?))
            }
            None => Ok(None),
        }
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        schema: &[PathBuf],
        schema_dir: &Option<PathBuf>,
        files: &[PathBuf],
        dialect: &Option<String>,
        format: &Option<OutputFormat>,
        positional_parameters: Option<bool>,
    ) -> Self {
        if !schema.is_empty() {
            self.schema = schema.iter().map(|p| p.display().to_string()).collect();
        }

        if schema_dir.is_some() {
            self.schema_dir = schema_dir.as_ref().map(|p| p.display().to_string());
        }

        if !files.is_empty() {
            self.queries = files.iter().map(|p| p.display().to_string()).collect();
        }

        if dialect.is_some() {
            self.dialect = dialect.clone();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if positional_parameters.is_some() {
            self.positional_parameters = positional_parameters;
        }

        self
    }
}

/// Nearest `sqltyped.toml` in `start` or one of its ancestors
fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|path| path.exists())
}
