//! Configuration loading and validation for hwprobe.
//!
//! Precedence: CLI (if provided) > config file > defaults.

use anyhow::{bail, Context, Result};
use hwprobe::cpu::source::{DEFAULT_PROC_ROOT, DEFAULT_SYS_ROOT};
use hwprobe::Sources;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, Commands, ConfigFormat, LogLevel, OutputFormat};

// Default configuration constants
pub const DEFAULT_WARM_UP_MS: u64 = 1000;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SAMPLES: usize = 1;

/// Default config file locations, in lookup order.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/hwprobe/hwprobe.yaml",
    "/etc/hwprobe/hwprobe.yml",
    "/etc/hwprobe/hwprobe.json",
    "./hwprobe.yaml",
    "./hwprobe.yml",
    "./hwprobe.json",
];

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Data sources
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "sys-root")]
    pub sys_root: Option<PathBuf>,

    // Sampling
    #[serde(alias = "warm-up-ms")]
    pub warm_up_ms: Option<u64>,
    #[serde(alias = "interval-ms")]
    pub interval_ms: Option<u64>,
    pub samples: Option<usize>,
    #[serde(alias = "per-thread")]
    pub per_thread: Option<bool>,

    // Output
    /// "table" | "yaml" | "json" | "toml"
    #[serde(alias = "output-format")]
    pub output_format: Option<String>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            sys_root: Some(PathBuf::from(DEFAULT_SYS_ROOT)),
            warm_up_ms: Some(DEFAULT_WARM_UP_MS),
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            samples: Some(DEFAULT_SAMPLES),
            per_thread: Some(false),
            output_format: Some(OutputFormat::Table.as_str().into()),
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    /// Data source roots for the library.
    pub fn sources(&self) -> Sources {
        Sources::new(
            self.proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            self.sys_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SYS_ROOT)),
        )
    }

    pub fn warm_up(&self) -> Duration {
        Duration::from_millis(self.warm_up_ms.unwrap_or(DEFAULT_WARM_UP_MS))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    pub fn samples(&self) -> usize {
        self.samples.unwrap_or(DEFAULT_SAMPLES)
    }

    /// Configured log level, falling back to `warn`.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Warn)
    }

    /// Configured output format, falling back to the table view.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
            .as_deref()
            .and_then(OutputFormat::parse)
            .unwrap_or(OutputFormat::Table)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    for (name, root) in [("proc_root", &cfg.proc_root), ("sys_root", &cfg.sys_root)] {
        if root.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            bail!("{name} must not be empty");
        }
    }

    if cfg.samples == Some(0) {
        bail!("samples must be at least 1");
    }

    if let Some(format) = cfg.output_format.as_deref() {
        if OutputFormat::parse(format).is_none() {
            bail!(
                "Invalid output_format '{}', expected one of table, yaml, json, toml",
                format
            );
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            bail!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            );
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(root) = &args.sys_root {
        config.sys_root = Some(root.clone());
    }
    if args.warm_up_ms.is_some() {
        config.warm_up_ms = args.warm_up_ms;
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().into());
    }
    if let Some(Commands::Usage {
        samples: Some(samples),
        ..
    }) = &args.command
    {
        config.samples = Some(*samples);
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
///
/// Missing files fall back to [`Config::default`]. Fields absent from the
/// file keep their default values.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let loaded = parse_config(&content, path.extension().and_then(|s| s.to_str()))
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_with_defaults(loaded))
}

/// Parses config content; the extension picks the format, YAML by default.
pub fn parse_config(content: &str, extension: Option<&str>) -> Result<Config> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

fn merge_with_defaults(loaded: Config) -> Config {
    let defaults = Config::default();
    Config {
        proc_root: loaded.proc_root.or(defaults.proc_root),
        sys_root: loaded.sys_root.or(defaults.sys_root),
        warm_up_ms: loaded.warm_up_ms.or(defaults.warm_up_ms),
        interval_ms: loaded.interval_ms.or(defaults.interval_ms),
        samples: loaded.samples.or(defaults.samples),
        per_thread: loaded.per_thread.or(defaults.per_thread),
        output_format: loaded.output_format.or(defaults.output_format),
        log_level: loaded.log_level.or(defaults.log_level),
    }
}

/// Serializes a config in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

/// Adds comments to YAML configuration
pub fn add_config_comments(yaml: String) -> String {
    let comments = r#"# hwprobe Configuration
# ======================
#
# Data Sources
# ------------
# proc_root: "/proc"           # Root of the procfs tree
# sys_root: "/sys"             # Root of the sysfs tree
#
# Sampling
# --------
# warm_up_ms: 1000             # Delay before the first utilization sample
# interval_ms: 1000            # Delay between utilization samples
# samples: 1                   # Number of utilization samples
# per_thread: false            # Report per-thread utilization
#
# Output
# ------
# output_format: "table"       # table, yaml, json, toml
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
