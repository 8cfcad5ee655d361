//! Generate-fixture command implementation.
//!
//! Writes a synthetic procfs/sysfs tree that the probe can be pointed at with
//! `--proc-root`/`--sys-root`.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::FixtureArch;

/// Manifest written next to the generated tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureManifest {
    pub version: String,
    pub generated_at: String,
    pub arch: String,
    pub physical_cores: u32,
    pub logical_cpus: u32,
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// A logical CPU of the generated tree.
struct LogicalCpu {
    processor: u32,
    core_id: u32,
}

/// x86 numbering: first threads of all cores, then their siblings.
fn x86_layout(cores: u32, threads_per_core: u32) -> Vec<LogicalCpu> {
    (0..threads_per_core)
        .flat_map(|thread| {
            (0..cores).map(move |core| LogicalCpu {
                processor: thread * cores + core,
                core_id: core,
            })
        })
        .collect()
}

fn x86_cpuinfo(layout: &[LogicalCpu], cores: u32, base_mhz: u32) -> String {
    let mut out = String::new();
    for cpu in layout {
        writeln!(out, "processor\t: {}", cpu.processor).ok();
        writeln!(out, "vendor_id\t: GenuineIntel").ok();
        writeln!(out, "cpu family\t: 6").ok();
        writeln!(out, "model\t\t: 158").ok();
        writeln!(
            out,
            "model name\t: Intel(R) Core(TM) Synthetic CPU @ {}.{:02}GHz",
            base_mhz / 1000,
            (base_mhz % 1000) / 10
        )
        .ok();
        writeln!(out, "cpu MHz\t\t: {}.000", base_mhz).ok();
        writeln!(out, "cache size\t: 12288 KB").ok();
        writeln!(out, "physical id\t: 0").ok();
        writeln!(out, "siblings\t: {}", layout.len()).ok();
        writeln!(out, "core id\t\t: {}", cpu.core_id).ok();
        writeln!(out, "cpu cores\t: {}", cores).ok();
        writeln!(out, "flags\t\t: fpu vme de pse tsc msr pae mce cx8 apic sse sse2 ht avx avx2").ok();
        writeln!(out).ok();
    }
    out
}

/// ARM parts used for the LITTLE and big clusters.
const LITTLE_PART: &str = "0xd05";
const BIG_PART: &str = "0xd0b";

fn arm_little_count(cores: u32) -> u32 {
    cores.div_ceil(2)
}

fn arm_cpuinfo(cores: u32) -> String {
    let little = arm_little_count(cores);
    let mut out = String::new();
    for processor in 0..cores {
        let (variant, part) = if processor < little {
            ("0x2", LITTLE_PART)
        } else {
            ("0x4", BIG_PART)
        };
        writeln!(out, "processor\t: {}", processor).ok();
        writeln!(out, "BogoMIPS\t: 52.00").ok();
        writeln!(out, "Features\t: fp asimd evtstrm aes pmull sha1 sha2 crc32 atomics").ok();
        writeln!(out, "CPU implementer\t: 0x41").ok();
        writeln!(out, "CPU architecture: 8").ok();
        writeln!(out, "CPU variant\t: {}", variant).ok();
        writeln!(out, "CPU part\t: {}", part).ok();
        writeln!(out, "CPU revision\t: 0").ok();
        writeln!(out).ok();
    }
    writeln!(out, "Hardware\t: Synthetic SoC").ok();
    writeln!(out, "Serial\t\t: 0000000000000000").ok();
    out
}

fn stat_content<R: Rng>(rng: &mut R, logical_cpus: u32) -> String {
    let mut lines = Vec::new();
    let mut total = [0u64; 8];
    for cpu in 0..logical_cpus {
        let fields: [u64; 8] = [
            rng.gen_range(10_000..500_000),
            rng.gen_range(0..10_000),
            rng.gen_range(5_000..200_000),
            rng.gen_range(1_000_000..5_000_000),
            rng.gen_range(0..20_000),
            0,
            rng.gen_range(0..5_000),
            0,
        ];
        for (sum, value) in total.iter_mut().zip(fields) {
            *sum += value;
        }
        lines.push(format!("cpu{} {} 0 0", cpu, join(&fields)));
    }

    let mut out = format!("cpu  {} 0 0\n", join(&total));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("intr 0\nctxt 0\nbtime 0\nprocesses 1\n");
    out
}

fn join(values: &[u64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes the cpufreq files of one directory. Values are in kHz.
fn write_cpufreq(dir: &Path, min_khz: u32, max_khz: u32, cur_khz: u32, base: bool) -> Result<()> {
    write_file(&dir.join("cpuinfo_min_freq"), &format!("{min_khz}\n"))?;
    write_file(&dir.join("cpuinfo_max_freq"), &format!("{max_khz}\n"))?;
    write_file(&dir.join("scaling_min_freq"), &format!("{min_khz}\n"))?;
    write_file(&dir.join("scaling_max_freq"), &format!("{max_khz}\n"))?;
    write_file(&dir.join("scaling_cur_freq"), &format!("{cur_khz}\n"))?;
    if base {
        write_file(&dir.join("base_frequency"), &format!("{}\n", max_khz * 3 / 4))?;
    }
    Ok(())
}

/// Writes a synthetic tree under `root` and returns its manifest.
pub fn write_fixture<R: Rng>(
    root: &Path,
    arch: FixtureArch,
    cores: u32,
    threads_per_core: u32,
    rng: &mut R,
) -> Result<FixtureManifest> {
    let proc_root = root.join("proc");
    let sys_root = root.join("sys");
    let cpu_root = sys_root.join("devices/system/cpu");
    let cores = cores.max(1);

    let logical_cpus = match arch {
        FixtureArch::X86 => {
            let threads_per_core = threads_per_core.max(1);
            let layout = x86_layout(cores, threads_per_core);
            let max_khz = rng.gen_range(35..=50) * 100_000;
            write_file(
                &proc_root.join("cpuinfo"),
                &x86_cpuinfo(&layout, cores, max_khz * 3 / 4000),
            )?;

            for cpu in &layout {
                let dir = cpu_root.join(format!("cpu{}", cpu.processor));
                write_file(&dir.join("topology/core_id"), &format!("{}\n", cpu.core_id))?;
                let cur_khz = rng.gen_range(800_000..=max_khz);
                write_cpufreq(&dir.join("cpufreq"), 800_000, max_khz, cur_khz, true)?;
            }
            layout.len() as u32
        }
        FixtureArch::Arm => {
            write_file(&proc_root.join("cpuinfo"), &arm_cpuinfo(cores))?;
            let little = arm_little_count(cores);

            for processor in 0..cores {
                let dir = cpu_root.join(format!("cpu{processor}"));
                // core_id restarts in every cluster
                let core_id = if processor < little {
                    processor
                } else {
                    processor - little
                };
                write_file(&dir.join("topology/core_id"), &format!("{core_id}\n"))?;
            }

            // Policy-based cpufreq: one policy per cluster, named after its
            // first CPU.
            let little_cur = rng.gen_range(408_000..=1_800_000);
            write_cpufreq(&cpu_root.join("cpufreq/policy0"), 408_000, 1_800_000, little_cur, false)?;
            if cores > little {
                let big_cur = rng.gen_range(408_000..=2_400_000);
                write_cpufreq(
                    &cpu_root.join(format!("cpufreq/policy{little}")),
                    408_000,
                    2_400_000,
                    big_cur,
                    false,
                )?;
            }
            cores
        }
    };

    write_file(&proc_root.join("stat"), &stat_content(rng, logical_cpus))?;

    let manifest = FixtureManifest {
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now().to_rfc3339(),
        arch: format!("{arch:?}").to_lowercase(),
        physical_cores: cores,
        logical_cpus,
        proc_root,
        sys_root,
    };
    write_file(
        &root.join("fixture.json"),
        &serde_json::to_string_pretty(&manifest)?,
    )?;
    Ok(manifest)
}

/// Generates a synthetic procfs/sysfs tree for testing purposes.
pub fn command_generate_fixture(
    output: PathBuf,
    arch: FixtureArch,
    cores: u32,
    threads_per_core: u32,
) -> Result<()> {
    debug!(
        "Generating fixture: arch={:?}, cores={}, threads_per_core={}, output={}",
        arch,
        cores,
        threads_per_core,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let manifest = write_fixture(&output, arch, cores, threads_per_core, &mut rng)?;

    info!(
        "Generated {} fixture with {} logical CPUs",
        manifest.arch, manifest.logical_cpus
    );
    println!("✅ Fixture written to: {}", output.display());
    println!(
        "   hwprobe --proc-root {} --sys-root {} cpus",
        manifest.proc_root.display(),
        manifest.sys_root.display()
    );
    Ok(())
}
