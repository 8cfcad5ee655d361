//! Clock speed probing from cpufreq.
//!
//! Per-core cpufreq directories (`cpu<N>/cpufreq`) are tried before the
//! shared policy directories (`cpufreq/policy<N>`) that ARM kernels expose.

use std::path::PathBuf;
use tracing::trace;

use super::source::{read_integer, Sources};

/// Returned when no candidate path yields a frequency.
pub const FREQUENCY_UNAVAILABLE: i64 = -1;

/// Which clock speed to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    Max,
    Regular,
    Min,
}

impl ClockKind {
    fn files(self) -> &'static [&'static str] {
        match self {
            ClockKind::Max => &["scaling_max_freq", "cpuinfo_max_freq"],
            ClockKind::Regular => &["base_frequency", "scaling_cur_freq", "cpuinfo_cur_freq"],
            ClockKind::Min => &["scaling_min_freq", "cpuinfo_min_freq"],
        }
    }
}

/// Ordered candidate paths for `kind` on logical core `core`.
pub fn candidate_paths(sources: &Sources, core: i64, kind: ClockKind) -> Vec<PathBuf> {
    let per_core = sources.cpu_dir(core).join("cpufreq");
    let policy = sources.cpufreq_policy_dir(core);
    let files = kind.files();

    let mut paths: Vec<PathBuf> = files.iter().map(|f| per_core.join(f)).collect();
    match kind {
        // base_frequency only exists per core (intel_pstate)
        ClockKind::Regular => paths.extend(files[1..].iter().map(|f| policy.join(f))),
        _ => paths.extend(files.iter().map(|f| policy.join(f))),
    }
    paths
}

/// Returns the first present, non-negative value in MHz (files hold kHz).
pub fn frequency_from_paths(paths: &[PathBuf]) -> i64 {
    for path in paths {
        if let Some(khz) = read_integer(path).filter(|khz| *khz >= 0) {
            trace!("Frequency {} kHz from {}", khz, path.display());
            return khz / 1000;
        }
    }
    FREQUENCY_UNAVAILABLE
}

/// Probes one clock speed of logical core `core` in MHz.
pub fn clock_speed_mhz(sources: &Sources, core: i64, kind: ClockKind) -> i64 {
    frequency_from_paths(&candidate_paths(sources, core, kind))
}

pub fn max_clock_speed_mhz(sources: &Sources, core: i64) -> i64 {
    clock_speed_mhz(sources, core, ClockKind::Max)
}

pub fn regular_clock_speed_mhz(sources: &Sources, core: i64) -> i64 {
    clock_speed_mhz(sources, core, ClockKind::Regular)
}

pub fn min_clock_speed_mhz(sources: &Sources, core: i64) -> i64 {
    clock_speed_mhz(sources, core, ClockKind::Min)
}

/// Current speed of each core in `0..cores`, read from `scaling_cur_freq`.
///
/// Cores without the file are skipped.
pub fn current_clock_speeds_mhz(sources: &Sources, cores: u32) -> Vec<i64> {
    (0..i64::from(cores))
        .filter_map(|core| {
            let path = sources.cpu_dir(core).join("cpufreq/scaling_cur_freq");
            read_integer(&path).filter(|khz| *khz >= 0).map(|khz| khz / 1000)
        })
        .collect()
}

/// Probed speed of `kind` for each core in `0..cores`, skipping cores where
/// nothing is readable.
pub fn clock_speeds_mhz(sources: &Sources, cores: u32, kind: ClockKind) -> Vec<i64> {
    (0..i64::from(cores))
        .map(|core| clock_speed_mhz(sources, core, kind))
        .filter(|mhz| *mhz != FREQUENCY_UNAVAILABLE)
        .collect()
}
