//! Configuration management for the CLI.
//!
//! The file mirrors the pipeline sections and adds `[settings]` and
//! `[publisher]`:
//!
//! ```toml
//! [settings]
//! color = true
//! format = "table"
//! schema_files = ["~/schemas/grants.toml"]
//!
//! [provider]
//! kind = "anthropic"
//!
//! [extraction]
//! concurrency_limit = 4
//!
//! [validation]
//! default_confidence = 0.5
//!
//! [publisher]
//! api_url = "https://live.linkedtrust.us/api"
//! ```

use crate::error::{CliError, Result};
use linkedclaims_domain::SchemaRegistry;
use linkedclaims_extractor::{ExtractorConfig, PipelineConfig};
use linkedclaims_gatekeeper::ValidationConfig;
use linkedclaims_llm::ProviderConfig;
use linkedclaims_publisher::PublisherConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings
    pub settings: Settings,

    /// LLM provider settings
    pub provider: ProviderConfig,

    /// Chunking, concurrency, and dedup settings
    pub extraction: ExtractorConfig,

    /// Candidate validation settings
    pub validation: ValidationConfig,

    /// Registry settings
    pub publisher: PublisherConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// TOML files with extra schema definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_files: Vec<PathBuf>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".linkedclaims").join("config.toml"))
    }

    /// Resolve an optional override to a concrete path.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Load configuration from file, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            debug!(path = %path.display(), "Loading configuration");
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Configuration with the extraction settings of a named preset.
    pub fn with_extraction(extraction: ExtractorConfig) -> Self {
        Self {
            extraction,
            ..Self::default()
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.pipeline().validate().map_err(CliError::Config)?;
        self.publisher
            .validate()
            .map_err(|e| CliError::Config(format!("[publisher] {}", e)))
    }

    /// Pipeline sections as a [`PipelineConfig`].
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            provider: self.provider.clone(),
            extraction: self.extraction.clone(),
            validation: self.validation.clone(),
        }
    }

    /// Built-in schemas plus those in `settings.schema_files`.
    pub fn schema_registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::with_builtin();
        for path in &self.settings.schema_files {
            let contents = fs::read_to_string(path)?;
            let added = registry.load_toml(&contents)?;
            debug!(path = %path.display(), added, "Loaded schema file");
        }
        Ok(registry)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            schema_files: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
