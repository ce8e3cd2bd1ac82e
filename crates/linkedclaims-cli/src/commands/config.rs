//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs, PresetArg};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use linkedclaims_extractor::ExtractorConfig;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let origin = if path.exists() {
                path.display().to_string()
            } else {
                format!("{} (not created, showing defaults)", path.display())
            };
            eprintln!("{}", formatter.info(&origin));
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Init { preset, force } => {
            init_config(path, preset, force)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote configuration to {}", path.display()))
            );
        }
    }

    Ok(())
}

/// Write a fresh configuration file for `preset`.
pub fn init_config(path: &Path, preset: PresetArg, force: bool) -> Result<Config> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let extraction = match preset {
        PresetArg::Default => ExtractorConfig::default(),
        PresetArg::Aggressive => ExtractorConfig::aggressive(),
        PresetArg::Lenient => ExtractorConfig::lenient(),
    };
    let config = Config::with_extraction(extraction);
    config.save(path)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, PresetArg::Aggressive, false).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.extraction, ExtractorConfig::aggressive());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        init_config(&path, PresetArg::Default, false).unwrap();
        assert!(matches!(
            init_config(&path, PresetArg::Lenient, false),
            Err(CliError::Config(_))
        ));

        init_config(&path, PresetArg::Lenient, true).unwrap();
        assert_eq!(
            Config::load(&path).unwrap().extraction,
            ExtractorConfig::lenient()
        );
    }
}
