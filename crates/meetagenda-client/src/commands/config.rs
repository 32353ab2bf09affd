//! `config dump|validate|path`.

use std::path::Path;

use meetagenda_providers::Capability;

use crate::config::{ClientConfig, configured_capabilities};
use crate::context::AppContext;
use crate::error::{ClientError, ClientResult};

/// Prints the effective configuration with plain secrets masked.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validates the configuration, then reports which vendors have a
/// credential. Nothing is sent to any vendor.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;
    let ctx = AppContext::new(config.clone())?;

    let available = configured_capabilities(ctx.source());
    for capability in Capability::ALL {
        let state = if available.contains(&capability) {
            "configured"
        } else {
            "missing"
        };
        println!(
            "{:<9} {} ({})",
            capability.as_str(),
            state,
            capability.candidates().join(" or ")
        );
    }
    match ctx.database_id(None) {
        Ok(id) => println!("database  {}", id),
        Err(ClientError::Config(_)) => println!("database  missing (NOTION_DATABASE_ID)"),
        Err(e) => return Err(e),
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Shows the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
