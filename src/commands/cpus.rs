//! `cpus` command: lists detected CPUs.

use anyhow::Result;
use hwprobe::{get_all_cpus_from, CpuRecord, Sources, FREQUENCY_UNAVAILABLE};
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::time::Instant;
use tracing::{debug, info};

use super::render;
use crate::cli::OutputFormat;

/// Per-core clock speeds of one record.
#[derive(Debug, Clone, Serialize)]
pub struct ClockReport {
    pub current_mhz: Vec<i64>,
    pub min_mhz: Vec<i64>,
    pub max_mhz: Vec<i64>,
}

/// One CPU with optional per-core clocks.
#[derive(Debug, Clone, Serialize)]
pub struct CpuEntry {
    #[serde(flatten)]
    pub record: CpuRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clocks: Option<ClockReport>,
}

/// Root structure of the `cpus` output.
#[derive(Debug, Clone, Serialize)]
pub struct CpuReport {
    pub cpus: Vec<CpuEntry>,
}

/// Enumerates CPUs and collects per-core clocks when requested.
pub fn collect_report(sources: &Sources, clocks: bool) -> CpuReport {
    let cpus = get_all_cpus_from(sources)
        .into_iter()
        .map(|record| {
            let clocks = clocks.then(|| ClockReport {
                current_mhz: record.current_clock_speeds_mhz(sources),
                min_mhz: record.min_clock_speeds_mhz(sources),
                max_mhz: record.max_clock_speeds_mhz(sources),
            });
            CpuEntry { record, clocks }
        })
        .collect();
    CpuReport { cpus }
}

fn mhz(value: i64) -> String {
    if value == FREQUENCY_UNAVAILABLE {
        "n/a".to_string()
    } else {
        format!("{value} MHz")
    }
}

fn count(value: Option<u32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn list(values: &[i64]) -> String {
    if values.is_empty() {
        return "n/a".to_string();
    }
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the report as a plain-text table.
pub fn render_table(report: &CpuReport) -> String {
    let mut out = String::new();
    if report.cpus.is_empty() {
        writeln!(out, "No CPUs detected").ok();
        return out;
    }

    for entry in &report.cpus {
        let cpu = &entry.record;
        writeln!(out, "CPU {} ({:?})", cpu.id, cpu.architecture).ok();
        writeln!(out, "{}", "-".repeat(50)).ok();
        writeln!(out, "{:18} {}", "Vendor:", cpu.vendor).ok();
        writeln!(out, "{:18} {}", "Model:", cpu.model_name).ok();
        writeln!(out, "{:18} {}", "Physical cores:", count(cpu.num_physical_cores)).ok();
        writeln!(out, "{:18} {}", "Logical cores:", count(cpu.num_logical_cores)).ok();
        let cache = cpu
            .cache_size_bytes
            .map_or_else(|| "n/a".to_string(), |b| format!("{} KB", b / 1024));
        writeln!(out, "{:18} {}", "Cache:", cache).ok();
        writeln!(out, "{:18} {}", "Max clock:", mhz(cpu.max_clock_speed_mhz)).ok();
        writeln!(out, "{:18} {}", "Regular clock:", mhz(cpu.regular_clock_speed_mhz)).ok();
        writeln!(out, "{:18} {}", "Flags:", cpu.flags.len()).ok();

        if let Some(clocks) = &entry.clocks {
            writeln!(out, "{:18} {}", "Current (MHz):", list(&clocks.current_mhz)).ok();
            writeln!(out, "{:18} {}", "Min (MHz):", list(&clocks.min_mhz)).ok();
            writeln!(out, "{:18} {}", "Max (MHz):", list(&clocks.max_mhz)).ok();
        }
        writeln!(out).ok();
    }
    out
}

/// Lists detected CPUs
pub fn command_cpus(sources: &Sources, format: OutputFormat, clocks: bool) -> Result<()> {
    debug!(
        "Enumerating CPUs from {} and {}",
        sources.proc_root.display(),
        sources.sys_root.display()
    );

    let start = Instant::now();
    let report = collect_report(sources, clocks);
    info!(
        "Enumerated {} CPUs in {:.2}ms",
        report.cpus.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    match render(&report, format)? {
        Some(output) => println!("{output}"),
        None => print!("{}", render_table(&report)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sources_with_cpuinfo(cpuinfo: &str) -> (TempDir, Sources) {
        let dir = TempDir::new().unwrap();
        let sources = Sources::new(dir.path().join("proc"), dir.path().join("sys"));
        fs::create_dir_all(&sources.proc_root).unwrap();
        fs::write(sources.cpuinfo(), cpuinfo).unwrap();
        (dir, sources)
    }

    #[test]
    fn test_render_table_empty() {
        let report = CpuReport { cpus: vec![] };
        assert_eq!(render_table(&report), "No CPUs detected\n");
    }

    #[test]
    fn test_report_with_clocks() {
        let (_dir, sources) = sources_with_cpuinfo(
            "processor\t: 0\nvendor_id\t: AuthenticAMD\nmodel name\t: AMD Ryzen 7 5800X\nphysical id\t: 0\nsiblings\t: 2\ncpu cores\t: 1\n",
        );
        let freq = sources.cpu_dir(1).join("cpufreq");
        fs::create_dir_all(&freq).unwrap();
        fs::write(freq.join("scaling_cur_freq"), "3800000").unwrap();
        fs::write(freq.join("scaling_max_freq"), "4850000").unwrap();

        let report = collect_report(&sources, true);
        assert_eq!(report.cpus.len(), 1);
        let clocks = report.cpus[0].clocks.as_ref().unwrap();
        assert_eq!(clocks.current_mhz, vec![3800]);
        assert_eq!(clocks.max_mhz, vec![4850]);
        assert!(clocks.min_mhz.is_empty());

        let table = render_table(&report);
        assert!(table.contains("AMD Ryzen 7 5800X"));
        assert!(table.contains("Max clock:         n/a"));
    }

    #[test]
    fn test_json_report_is_flat() {
        let (_dir, sources) = sources_with_cpuinfo(
            "processor\t: 0\nvendor_id\t: GenuineIntel\nphysical id\t: 0\n",
        );
        let report = collect_report(&sources, false);
        let json = render(&report, OutputFormat::Json).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cpus"][0]["vendor"], "GenuineIntel");
        assert_eq!(value["cpus"][0]["architecture"], "x86");
        assert!(value["cpus"][0].get("clocks").is_none());
    }
}
