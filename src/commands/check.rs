//! `check` command: validates data sources and configuration.

use anyhow::Result;
use hwprobe::cpu::frequency::{max_clock_speed_mhz, regular_clock_speed_mhz};
use hwprobe::cpu::source::read_integer;
use hwprobe::system::read_cpu_stats;
use hwprobe::{get_all_cpus_from, Sources, FREQUENCY_UNAVAILABLE};
use tracing::debug;

use crate::config::{validate_effective_config, Config};

/// Online logical CPUs as reported by the C library.
pub fn online_cpus() -> Option<u64> {
    // SAFETY: sysconf has no preconditions
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    (n > 0).then_some(n as u64)
}

/// Kernel clock ticks per second (the unit of /proc/stat).
pub fn clock_ticks() -> Option<u64> {
    // SAFETY: sysconf has no preconditions
    let n = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    (n > 0).then_some(n as u64)
}

/// Checks /proc/cpuinfo parsing. Returns false on failure.
fn check_cpuinfo(sources: &Sources) -> bool {
    println!("\n📁 Checking {}...", sources.cpuinfo().display());
    if !sources.cpuinfo().exists() {
        println!("   ❌ cpuinfo not found");
        return false;
    }

    let cpus = get_all_cpus_from(sources);
    if cpus.is_empty() {
        println!("   ❌ No CPUs parsed from cpuinfo");
        return false;
    }
    println!("   ✅ {} CPU record(s) parsed", cpus.len());

    let logical: u32 = cpus.iter().map(|c| c.logical_cores()).sum();
    match online_cpus() {
        Some(online) if sources == &Sources::default() && u64::from(logical) != online => {
            println!(
                "   ⚠️  Parsed {} logical cores, sysconf reports {} online",
                logical, online
            );
        }
        Some(online) => println!("   ✅ {} logical cores (sysconf: {} online)", logical, online),
        None => println!("   ✅ {} logical cores", logical),
    }
    true
}

/// Checks /proc/stat counters. Returns false on failure.
fn check_stat(sources: &Sources) -> bool {
    println!("\n⏱️  Checking {}...", sources.stat().display());
    match read_cpu_stats(&sources.stat()) {
        Ok(stats) => {
            println!(
                "   ✅ {} cpu lines (aggregate + {} threads)",
                stats.len(),
                stats.len().saturating_sub(1)
            );
            if let Some(ticks) = clock_ticks() {
                println!("   ✅ {} clock ticks per second", ticks);
            }
            true
        }
        Err(e) => {
            println!("   ❌ {}", e);
            false
        }
    }
}

/// Checks cpufreq and topology files of the first core. Never fails: many
/// virtual machines expose neither.
fn check_cpufreq(sources: &Sources) -> bool {
    println!("\n⚡ Checking cpufreq and topology under {}...", sources.cpu_root().display());
    let max = max_clock_speed_mhz(sources, 0);
    let regular = regular_clock_speed_mhz(sources, 0);
    if max == FREQUENCY_UNAVAILABLE && regular == FREQUENCY_UNAVAILABLE {
        println!("   ⚠️  No cpufreq data for cpu0 (clock speeds will be n/a)");
    } else {
        println!("   ✅ cpu0: max {} MHz, regular {} MHz", max, regular);
    }

    match read_integer(&sources.core_id(0)) {
        Some(core_id) => println!("   ✅ cpu0 topology core_id {}", core_id),
        None => println!("   ⚠️  No topology/core_id for cpu0"),
    }
    true
}

/// Validates data sources and configuration
pub fn command_check(
    cpuinfo: bool,
    stat: bool,
    cpufreq: bool,
    all: bool,
    config: &Config,
) -> Result<()> {
    println!("🔍 hwprobe - System Check");
    println!("=========================");

    let sources = config.sources();
    debug!("Checking sources {:?}", sources);
    let none_selected = !(cpuinfo || stat || cpufreq);
    let mut all_ok = true;

    if cpuinfo || all || none_selected {
        all_ok &= check_cpuinfo(&sources);
    }
    if stat || all || none_selected {
        all_ok &= check_stat(&sources);
    }
    if cpufreq || all || none_selected {
        all_ok &= check_cpufreq(&sources);
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysconf_values() {
        assert!(online_cpus().unwrap_or(1) >= 1);
        assert!(clock_ticks().unwrap_or(100) > 0);
    }

    #[test]
    fn test_check_stat_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let sources = Sources::new(dir.path(), dir.path());
        assert!(!check_stat(&sources));
        assert!(!check_cpuinfo(&sources));
        assert!(check_cpufreq(&sources));
    }
}
