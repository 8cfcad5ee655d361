//! `config` command: writes a default configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::cli::ConfigFormat;
use crate::config::{add_config_comments, render_config, Config};

/// Generates configuration files
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("hwprobe.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Configuration written to {}", output.display());
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        for (name, format) in [
            ("hwprobe.yaml", ConfigFormat::Yaml),
            ("hwprobe.json", ConfigFormat::Json),
            ("hwprobe.toml", ConfigFormat::Toml),
        ] {
            let path = dir.path().join(name);
            command_config(Some(path.clone()), format, true).unwrap();
            assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
        }
    }
}
