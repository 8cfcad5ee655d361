use hwprobe::{
    get_all_cpus_from, Architecture, Sources, UtilizationSampler, FREQUENCY_UNAVAILABLE,
    UTILIZATION_UNAVAILABLE,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn fixture() -> (TempDir, Sources) {
    let dir = TempDir::new().unwrap();
    let sources = Sources::new(dir.path().join("proc"), dir.path().join("sys"));
    fs::create_dir_all(dir.path().join("proc")).unwrap();
    (dir, sources)
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const XEON_TWO_THREADS: &str = "processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
physical id\t: 0
siblings\t: 2
cpu cores\t: 1
cache size\t: 8192 KB
flags\t\t: fpu vme sse2 avx2

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
physical id\t: 0
siblings\t: 2
cpu cores\t: 1
cache size\t: 8192 KB
flags\t\t: fpu vme sse2 avx2
";

fn arm_block(processor: u32, part: &str) -> String {
    format!(
        "processor\t: {processor}\nBogoMIPS\t: 38.40\nFeatures\t: fp asimd evtstrm aes\nCPU implementer\t: 0x41\nCPU architecture: 8\nCPU variant\t: 0x0\nCPU part\t: {part}\nCPU revision\t: 4\n"
    )
}

#[test]
fn test_missing_cpuinfo_yields_no_cpus() {
    let (_dir, sources) = fixture();
    assert!(get_all_cpus_from(&sources).is_empty());
}

#[test]
fn test_empty_cpuinfo_yields_no_cpus() {
    let (_dir, sources) = fixture();
    write(&sources.cpuinfo(), "");
    assert!(get_all_cpus_from(&sources).is_empty());
}

#[test]
fn test_x86_threads_collapse_into_one_package() {
    let (_dir, sources) = fixture();
    write(&sources.cpuinfo(), XEON_TWO_THREADS);
    write(
        &sources.cpu_dir(0).join("cpufreq/cpuinfo_max_freq"),
        "4000000\n",
    );
    write(
        &sources.cpu_dir(0).join("cpufreq/base_frequency"),
        "1800000\n",
    );

    let cpus = get_all_cpus_from(&sources);
    assert_eq!(cpus.len(), 1);

    let cpu = &cpus[0];
    assert_eq!(cpu.id, 0);
    assert_eq!(cpu.architecture, Architecture::X86);
    assert_eq!(cpu.vendor, "GenuineIntel");
    assert_eq!(cpu.num_logical_cores, Some(2));
    assert_eq!(cpu.num_physical_cores, Some(1));
    assert_eq!(cpu.cache_size_bytes, Some(8192 * 1024));
    assert!(cpu.flags.contains("avx2"));
    assert_eq!(cpu.max_clock_speed_mhz, 4000);
    assert_eq!(cpu.regular_clock_speed_mhz, 1800);
}

#[test]
fn test_scaling_files_take_priority_over_cpuinfo_files() {
    let (_dir, sources) = fixture();
    write(&sources.cpuinfo(), XEON_TWO_THREADS);
    let cpufreq = sources.cpu_dir(0).join("cpufreq");
    write(&cpufreq.join("scaling_max_freq"), "3500000\n");
    write(&cpufreq.join("cpuinfo_max_freq"), "4000000\n");

    let cpus = get_all_cpus_from(&sources);
    assert_eq!(cpus[0].max_clock_speed_mhz, 3500);
    assert_eq!(cpus[0].regular_clock_speed_mhz, FREQUENCY_UNAVAILABLE);
}

#[test]
fn test_arm_big_little_uses_sysfs_topology() {
    let (_dir, sources) = fixture();
    let mut cpuinfo = String::new();
    for processor in 0..4 {
        cpuinfo.push_str(&arm_block(processor, "0xd05"));
        cpuinfo.push('\n');
    }
    for processor in 4..6 {
        cpuinfo.push_str(&arm_block(processor, "0xd0b"));
        cpuinfo.push('\n');
    }
    cpuinfo.push_str("Hardware\t: BCM2835\nSerial\t\t: 00000000deadbeef\n");
    write(&sources.cpuinfo(), &cpuinfo);

    for processor in 0..6 {
        write(&sources.core_id(processor), &format!("{processor}\n"));
    }
    write(
        &sources.cpufreq_policy_dir(0).join("cpuinfo_max_freq"),
        "1800000\n",
    );
    write(
        &sources.cpufreq_policy_dir(4).join("cpuinfo_max_freq"),
        "2400000\n",
    );

    let cpus = get_all_cpus_from(&sources);
    let ids: Vec<i64> = cpus.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 4]);

    assert!(cpus.iter().all(|c| c.architecture == Architecture::Arm));
    assert!(cpus.iter().all(|c| c.vendor == "ARM"));
    assert_eq!(cpus[0].model_name, "Cortex-A55");
    assert_eq!(cpus[1].model_name, "Cortex-A76");
    assert_eq!(cpus[0].max_clock_speed_mhz, 1800);
    assert_eq!(cpus[1].max_clock_speed_mhz, 2400);
    for cpu in &cpus {
        assert_eq!(cpu.num_logical_cores, Some(6));
        assert_eq!(cpu.num_physical_cores, Some(6));
        assert_eq!(cpu.cache_size_bytes, None);
    }
}

#[test]
fn test_per_core_clock_lists() {
    let (_dir, sources) = fixture();
    write(&sources.cpuinfo(), XEON_TWO_THREADS);
    for (core, cur, min) in [(0, "1900000", "400000"), (1, "2100000", "400000")] {
        let cpufreq = sources.cpu_dir(core).join("cpufreq");
        write(&cpufreq.join("scaling_cur_freq"), cur);
        write(&cpufreq.join("scaling_min_freq"), min);
    }

    let cpu = &get_all_cpus_from(&sources)[0];
    assert_eq!(cpu.current_clock_speeds_mhz(&sources), vec![1900, 2100]);
    assert_eq!(cpu.min_clock_speeds_mhz(&sources), vec![400, 400]);
    assert!(cpu.max_clock_speeds_mhz(&sources).is_empty());
}

#[test]
fn test_proc_stat_sampler_tracks_file_changes() {
    let (_dir, sources) = fixture();
    write(
        &sources.stat(),
        "cpu  100 0 100 800 0 0 0 0 0 0\ncpu0 50 0 50 400 0 0 0 0 0 0\ncpu1 50 0 50 400 0 0 0 0 0 0\nintr 12345\n",
    );

    let mut sampler =
        UtilizationSampler::from_sources(&sources, 2).with_warm_up(Duration::ZERO);
    sampler.prime();
    assert!(sampler.is_primed());

    // +100 working, +100 idle on the aggregate line
    write(
        &sources.stat(),
        "cpu  200 0 100 900 0 0 0 0 0 0\ncpu0 150 0 50 400 0 0 0 0 0 0\ncpu1 50 0 50 500 0 0 0 0 0 0\nintr 12345\n",
    );

    let utilization = sampler.cpu_utilization();
    assert!((utilization - 0.5).abs() < 1e-9);

    let threads = sampler.threads_utilization();
    assert_eq!(threads.len(), 2);
    assert!((threads[0] - 1.0).abs() < 1e-9);
    assert_eq!(threads[1], 0.0);

    // No change since the previous sample: empty window
    assert_eq!(sampler.cpu_utilization(), UTILIZATION_UNAVAILABLE);
}

#[test]
fn test_proc_stat_sampler_without_stat_file() {
    let (_dir, sources) = fixture();
    let mut sampler =
        UtilizationSampler::from_sources(&sources, 4).with_warm_up(Duration::ZERO);

    assert_eq!(sampler.cpu_utilization(), UTILIZATION_UNAVAILABLE);
    assert_eq!(sampler.thread_utilization(0), UTILIZATION_UNAVAILABLE);
    assert_eq!(
        sampler.threads_utilization(),
        vec![UTILIZATION_UNAVAILABLE; 4]
    );
}

#[test]
fn test_proc_stat_sampler_with_saturated_counters() {
    let (_dir, sources) = fixture();
    let max = u64::MAX;
    write(
        &sources.stat(),
        &format!("cpu  {max} {max} 0 {max} 0 0 0 0 0 0\ncpu0 {max} 1 0 0 0 0 0 0 0 0\n"),
    );

    let mut sampler =
        UtilizationSampler::from_sources(&sources, 1).with_warm_up(Duration::ZERO);
    sampler.prime();

    assert_eq!(sampler.cpu_utilization(), UTILIZATION_UNAVAILABLE);
    assert_eq!(sampler.thread_utilization(0), UTILIZATION_UNAVAILABLE);
}
