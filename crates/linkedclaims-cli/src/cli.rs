//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LinkedClaims - extract verifiable claims from documents and publish them.
#[derive(Debug, Parser)]
#[command(name = "linkedclaims")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.linkedclaims/config.toml)
    #[arg(short, long, global = true, env = "LINKEDCLAIMS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract claims from a document
    Extract(ExtractArgs),

    /// List registered claim schemas
    Schemas(SchemasArgs),

    /// Publish extracted claims to a LinkedTrust registry
    Publish(PublishArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Document file (plain text; form feeds separate pages)
    #[arg(long, group = "input")]
    pub file: Option<PathBuf>,

    /// Document URL to fetch
    #[arg(long, group = "input")]
    pub url: Option<String>,

    /// Document text given inline
    #[arg(long, group = "input")]
    pub text: Option<String>,

    /// Read the document from stdin
    #[arg(long, group = "input")]
    pub stdin: bool,

    /// Schema to extract
    #[arg(short, long, default_value = "impact")]
    pub schema: String,

    /// Source URI recorded on every claim (defaults to the URL or file path)
    #[arg(long)]
    pub source_uri: Option<String>,

    /// Provider override
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum chunks in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write the full extraction result as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the schemas command.
#[derive(Debug, Parser)]
pub struct SchemasArgs {
    /// Show a single schema
    pub name: Option<String>,
}

/// Arguments for the publish command.
#[derive(Debug, Parser)]
pub struct PublishArgs {
    /// Saved extraction result (JSON); reads stdin when omitted
    pub input: Option<PathBuf>,

    /// Only publish claims at or above this confidence
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Print the payloads instead of submitting them
    #[arg(long)]
    pub dry_run: bool,

    /// Registry API base URL override
    #[arg(long)]
    pub api_url: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a configuration file
    Init {
        /// Settings preset
        #[arg(short, long, value_enum, default_value = "default")]
        preset: PresetArg,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Provider argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI Chat Completions API
    Openai,
    /// Offline mock (returns no claims)
    Mock,
}

/// Extraction settings preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced settings
    Default,
    /// More parallelism, document deadline, no re-asks
    Aggressive,
    /// Fewer concurrent calls, larger chunks, more re-asks
    Lenient,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ProviderArg> for linkedclaims_llm::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Anthropic => linkedclaims_llm::ProviderKind::Anthropic,
            ProviderArg::Openai => linkedclaims_llm::ProviderKind::OpenAi,
            ProviderArg::Mock => linkedclaims_llm::ProviderKind::Mock,
        }
    }
}
