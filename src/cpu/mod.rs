//! CPU enumeration, clock speeds and utilization.
//!
//! [`get_all_cpus`] reads `/proc/cpuinfo`, groups its per-processor blocks
//! into one [`CpuRecord`] per physical entity and probes cpufreq for each
//! record. Utilization is sampled separately through a
//! [`UtilizationSampler`] obtained from a record.

pub mod frequency;
pub mod source;
pub mod tokenizer;
pub mod topology;
pub mod utilization;
pub mod vendor;

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

pub use frequency::{ClockKind, FREQUENCY_UNAVAILABLE};
pub use source::Sources;
pub use utilization::{
    prime_all, Jiffies, JiffiesSource, ProcStat, UtilizationSampler, UTILIZATION_UNAVAILABLE,
};

/// Vendor family a record was parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    Arm,
    Other,
}

/// One detected processor package (x86) or ARM core type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuRecord {
    /// x86: `physical id`. ARM: logical index of the first processor of
    /// this core type.
    pub id: i64,
    pub architecture: Architecture,
    pub vendor: String,
    pub model_name: String,
    pub num_physical_cores: Option<u32>,
    pub num_logical_cores: Option<u32>,
    pub cache_size_bytes: Option<u64>,
    pub flags: BTreeSet<String>,
    /// MHz, or [`FREQUENCY_UNAVAILABLE`].
    pub max_clock_speed_mhz: i64,
    /// MHz, or [`FREQUENCY_UNAVAILABLE`].
    pub regular_clock_speed_mhz: i64,
}

impl CpuRecord {
    /// Logical core count, zero when unknown.
    pub fn logical_cores(&self) -> u32 {
        self.num_logical_cores.unwrap_or(0)
    }

    /// Current clock speed of each logical core in MHz.
    pub fn current_clock_speeds_mhz(&self, sources: &Sources) -> Vec<i64> {
        frequency::current_clock_speeds_mhz(sources, self.logical_cores())
    }

    /// Minimum clock speed of each logical core in MHz.
    pub fn min_clock_speeds_mhz(&self, sources: &Sources) -> Vec<i64> {
        frequency::clock_speeds_mhz(sources, self.logical_cores(), ClockKind::Min)
    }

    /// Maximum clock speed of each logical core in MHz.
    pub fn max_clock_speeds_mhz(&self, sources: &Sources) -> Vec<i64> {
        frequency::clock_speeds_mhz(sources, self.logical_cores(), ClockKind::Max)
    }

    /// A sampler sized to this record's logical cores.
    ///
    /// The sampler carries the default one second warm-up, taken on its first
    /// measurement. Use [`prime_all`] to warm up the samplers of several
    /// records together.
    pub fn utilization_sampler(&self, sources: &Sources) -> UtilizationSampler {
        UtilizationSampler::from_sources(sources, self.logical_cores() as usize)
    }
}

/// Enumerates CPUs from the live `/proc` and `/sys`.
pub fn get_all_cpus() -> Vec<CpuRecord> {
    get_all_cpus_from(&Sources::default())
}

/// Enumerates CPUs from the given trees.
///
/// A missing or unreadable cpuinfo file yields an empty list.
pub fn get_all_cpus_from(sources: &Sources) -> Vec<CpuRecord> {
    match source::read_text(&sources.cpuinfo()) {
        Some(text) => topology::build(&text, sources),
        None => {
            warn!("{} not readable, no CPUs enumerated", sources.cpuinfo().display());
            Vec::new()
        }
    }
}
