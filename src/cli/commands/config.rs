//! Config Command
//!
//! Manage langarbiter configuration.
//!
//! Usage:
//!   langarbiter config show [-f json]
//!   langarbiter config path
//!   langarbiter config init [-g] [--force]

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Show the effective configuration (secrets omitted)
pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    println!(
        "{}",
        ConfigLoader::render(config, format == OutputFormat::Json)?
    );
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let output = Output::new();
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    output.success(&format!(
        "Initialized {} configuration",
        if global { "global" } else { "project" }
    ));
    println!("  Config: {}", path.display());
    if !force {
        output.info("Existing files are kept; pass --force to overwrite");
    }
    Ok(())
}
