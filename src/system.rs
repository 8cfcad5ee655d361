//! CPU time counters from the /proc/stat file.
//!
//! This module parses the `cpu` lines of /proc/stat into [`CpuStat`] values.
//! The first line is the aggregate over all CPUs, the following `cpuN` lines
//! are the individual logical CPUs.

use std::fs;
use std::path::Path;

/// CPU time counters of one /proc/stat line, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields), saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |sum, v| sum.saturating_add(*v))
    }

    /// Calculate non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Calculate active time.
    pub fn working(&self) -> u64 {
        self.total().saturating_sub(self.idle_total())
    }
}

/// Parses a single `cpu`/`cpuN` line.
///
/// Format: "cpu0 4705 356 584 3699176 23060 0 15 0 0 0"
/// Missing trailing fields (older kernels have no `steal`) count as zero.
pub fn parse_cpu_stat_line(line: &str) -> Option<(String, CpuStat)> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    if !name.starts_with("cpu") {
        return None;
    }

    let fields: Vec<u64> = parts
        .take(8)
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or(0);

    Some((
        name.to_string(),
        CpuStat {
            user: field(0),
            nice: field(1),
            system: field(2),
            idle: field(3),
            iowait: field(4),
            irq: field(5),
            softirq: field(6),
            steal: field(7),
        },
    ))
}

/// Parses all `cpu` lines of /proc/stat content, in file order.
pub fn parse_cpu_stats(content: &str) -> Vec<(String, CpuStat)> {
    content
        .lines()
        .take_while(|line| line.starts_with("cpu"))
        .filter_map(parse_cpu_stat_line)
        .collect()
}

/// Reads CPU statistics from a /proc/stat file.
///
/// Returns the `cpu` lines in file order: index 0 is the aggregate, index
/// `i + 1` is logical CPU `i`.
pub fn read_cpu_stats(path: &Path) -> Result<Vec<(String, CpuStat)>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let stats = parse_cpu_stats(&content);
    if stats.is_empty() {
        return Err(format!("No CPU statistics found in {}", path.display()));
    }

    Ok(stats)
}
