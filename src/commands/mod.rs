//! CLI command implementations for hwprobe.
//!
//! This module provides implementations for all CLI subcommands:
//! - `cpus`: CPU enumeration
//! - `usage`: Utilization sampling
//! - `check`: Data source validation
//! - `config`: Configuration file generation
//! - `generate-fixture`: Synthetic procfs/sysfs tree generation

pub mod check;
pub mod config;
pub mod cpus;
pub mod generate;
pub mod usage;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use cpus::command_cpus;
pub use generate::command_generate_fixture;
pub use usage::command_usage;

use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Serializes a report for the non-table output formats.
pub fn render<T: Serialize>(report: &T, format: OutputFormat) -> Result<Option<String>> {
    let output = match format {
        OutputFormat::Table => return Ok(None),
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Toml => toml::to_string_pretty(report)?,
    };
    Ok(Some(output))
}
