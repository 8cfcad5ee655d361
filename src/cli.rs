//! CLI arguments and subcommands for hwprobe.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for CPU reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Yaml,
    Json,
    Toml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

/// Fixture flavour for `generate-fixture`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FixtureArch {
    X86,
    Arm,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "hwprobe",
    about = "CPU topology, clock speed and utilization probe",
    long_about = "CPU topology, clock speed and utilization probe.\n\n\
                  Reads /proc/cpuinfo, /proc/stat and the cpufreq/topology parts of sysfs \
                  and reports one record per CPU package (x86) or core type (ARM).",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the procfs tree
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Root of the sysfs tree
    #[arg(long)]
    pub sys_root: Option<PathBuf>,

    /// Warm-up delay before the first utilization sample (ms)
    #[arg(long)]
    pub warm_up_ms: Option<u64>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List detected CPUs
    Cpus {
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Include per-core current/min/max clock speeds
        #[arg(long)]
        clocks: bool,
    },

    /// Sample CPU utilization
    Usage {
        /// Number of samples
        #[arg(short = 'n', long)]
        samples: Option<usize>,

        /// Delay between samples (ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Also report per-thread utilization
        #[arg(long)]
        per_thread: bool,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Validate data sources and system requirements
    Check {
        /// Check cpuinfo parsing
        #[arg(long)]
        cpuinfo: bool,

        /// Check /proc/stat counters
        #[arg(long)]
        stat: bool,

        /// Check cpufreq and topology files
        #[arg(long)]
        cpufreq: bool,

        /// Check all sources
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate a synthetic procfs/sysfs tree
    GenerateFixture {
        /// Output directory
        #[arg(short = 'o', long, default_value = "fixture")]
        output: PathBuf,

        /// CPU flavour to emulate
        #[arg(long, value_enum, default_value = "x86")]
        arch: FixtureArch,

        /// Physical cores
        #[arg(long, default_value_t = 4)]
        cores: u32,

        /// Hardware threads per core (x86 only)
        #[arg(long, default_value_t = 2)]
        threads_per_core: u32,
    },
}
