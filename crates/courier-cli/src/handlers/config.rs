//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::{Path, PathBuf};

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        PathBuf::from(".courier.yaml")
    };

    if write_default_config(&path, args.force)? {
        output.success(&format!("✓ Created config at {}", path.display()))?;
        output.info("Edit it to set base_url and public_endpoints for your API.")
    } else {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))
    }
}

/// Write the default config; returns false if it exists and `force` is off
fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    Config::default().save(path)?;
    Ok(true)
}

/// Handle config show subcommand
fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let content = match args.format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| Error::config(format!("Failed to serialize as JSON: {}", e)))?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| Error::config(format!("Failed to serialize as YAML: {}", e)))?,
    };

    output.writeln(content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_default_config_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".courier.yaml");

        assert!(write_default_config(&path, false).unwrap());
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, Config::default());

        std::fs::write(&path, "pipeline:\n  base_url: https://kept.example.com\n").unwrap();
        assert!(!write_default_config(&path, false).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("kept.example.com"));

        assert!(write_default_config(&path, true).unwrap());
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }
}
