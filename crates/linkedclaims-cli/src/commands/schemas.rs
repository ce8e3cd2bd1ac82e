//! Schemas command implementation.

use crate::cli::SchemasArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use linkedclaims_extractor::ExtractorError;

/// Execute the schemas command.
pub fn execute_schemas(args: SchemasArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let registry = config.schema_registry()?;

    let schemas = match &args.name {
        Some(name) => vec![registry.get_schema(name).map_err(ExtractorError::from)?],
        None => registry.list_schemas(),
    };

    println!("{}", formatter.format_schemas(&schemas)?);
    Ok(())
}
