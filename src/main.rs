// hwprobe - version 0.1.0
// CPU topology, clock speed and utilization probe with tracing logging
use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

mod cli;
mod commands;
mod config;

use cli::{Args, Commands, LogLevel};
use commands::{
    command_check, command_config, command_cpus, command_generate_fixture, command_usage,
};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with configured log level
fn setup_logging(level: LogLevel) -> Result<()> {
    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// Exits with status 1 when the effective config is invalid
fn ensure_valid(config: &Config) {
    if let Err(e) = validate_effective_config(config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    if args.check_config {
        ensure_valid(&config);
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        return show_config(&config, &args.config_format);
    }

    ensure_valid(&config);
    setup_logging(config.log_level())?;
    info!("Starting hwprobe");

    let sources = config.sources();
    let command = args.command.unwrap_or(Commands::Cpus {
        format: None,
        clocks: false,
    });

    match command {
        Commands::Cpus { format, clocks } => {
            command_cpus(&sources, format.unwrap_or(config.output_format()), clocks)
        }
        Commands::Usage {
            interval_ms,
            per_thread,
            format,
            ..
        } => {
            let interval = interval_ms
                .map(std::time::Duration::from_millis)
                .unwrap_or_else(|| config.interval());
            command_usage(
                &sources,
                config.samples(),
                config.warm_up(),
                interval,
                per_thread || config.per_thread.unwrap_or(false),
                format.unwrap_or(config.output_format()),
            )
        }
        Commands::Check {
            cpuinfo,
            stat,
            cpufreq,
            all,
        } => command_check(cpuinfo, stat, cpufreq, all, &config),
        Commands::Config {
            output,
            format,
            commented,
        } => command_config(output, format, commented),
        Commands::GenerateFixture {
            output,
            arch,
            cores,
            threads_per_core,
        } => command_generate_fixture(output, arch, cores, threads_per_core),
    }
}
