//! CPU topology and utilization probe for Linux.
//!
//! Reads `/proc/cpuinfo`, `/proc/stat` and the cpufreq/topology parts of
//! sysfs and turns them into [`CpuRecord`] values. No operation here fails
//! loudly: unreadable sources produce empty results and invalid measurements
//! produce the sentinels [`FREQUENCY_UNAVAILABLE`] and
//! [`UTILIZATION_UNAVAILABLE`].
//!
//! ```no_run
//! use hwprobe::{get_all_cpus, prime_all, Sources, DEFAULT_WARM_UP};
//!
//! let sources = Sources::default();
//! let cpus = get_all_cpus();
//! let mut samplers: Vec<_> = cpus.iter().map(|cpu| cpu.utilization_sampler(&sources)).collect();
//!
//! // One warm-up for all records instead of one per sampler
//! prime_all(samplers.iter_mut(), DEFAULT_WARM_UP);
//! for (cpu, sampler) in cpus.iter().zip(&mut samplers) {
//!     println!("{} {}: {:.2}", cpu.vendor, cpu.model_name, sampler.cpu_utilization());
//! }
//! ```

pub mod cpu;
pub mod system;

pub use cpu::utilization::DEFAULT_WARM_UP;
pub use cpu::{
    get_all_cpus, get_all_cpus_from, prime_all, Architecture, ClockKind, CpuRecord, Jiffies,
    JiffiesSource, ProcStat, Sources, UtilizationSampler, FREQUENCY_UNAVAILABLE,
    UTILIZATION_UNAVAILABLE,
};
