//! Configuration management commands.

use crate::cli::ConfigCommand;
use crate::error::CliError;
use crate::output::success;
use crate::{CliConfig, CliResult};

/// Runs a config command.
pub fn run_config(cmd: ConfigCommand, config: &mut CliConfig) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show => {
            let content = toml::to_string_pretty(config)
                .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
            println!("{content}");
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            match key.as_str() {
                "backend-url" => config.backend_url = value,
                "api-key" => config.api_key = Some(value),
                "thumbprint" => config.default_thumbprint = Some(value),
                other => {
                    return Err(CliError::InvalidArgument(format!(
                        "unknown config key: {other} (expected backend-url, api-key, or thumbprint)"
                    )))
                }
            }
            config.save()?;
            success(&format!("Updated {key}"));
            Ok(())
        }
    }
}
