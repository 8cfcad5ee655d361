//! `usage` command: samples whole-CPU and per-thread utilization.

use anyhow::Result;
use hwprobe::{
    get_all_cpus_from, prime_all, JiffiesSource, Sources, UtilizationSampler,
    UTILIZATION_UNAVAILABLE,
};
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::render;
use crate::cli::OutputFormat;

/// Utilization of one CPU record in one sample.
#[derive(Debug, Clone, Serialize)]
pub struct CpuUsage {
    pub id: i64,
    pub model_name: String,
    /// Fraction in `[0, 1]`, or -1.0.
    pub utilization: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<Vec<f64>>,
}

/// One sampling round.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSample {
    pub sample: usize,
    pub cpus: Vec<CpuUsage>,
}

/// Root structure of the `usage` output.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub samples: Vec<UsageSample>,
}

/// Samples every sampler `samples` times, `interval` apart.
///
/// Samplers are primed together and the warm-up is taken once for all of
/// them.
pub fn collect_samples<S: JiffiesSource>(
    samplers: &mut [(i64, String, UtilizationSampler<S>)],
    samples: usize,
    warm_up: Duration,
    interval: Duration,
    per_thread: bool,
) -> UsageReport {
    prime_all(samplers.iter_mut().map(|(_, _, sampler)| sampler), warm_up);

    let mut report = UsageReport {
        samples: Vec::with_capacity(samples),
    };
    for sample in 1..=samples {
        if sample > 1 && !interval.is_zero() {
            thread::sleep(interval);
        }

        let cpus = samplers
            .iter_mut()
            .map(|(id, model_name, sampler)| CpuUsage {
                id: *id,
                model_name: model_name.clone(),
                utilization: sampler.cpu_utilization(),
                threads: per_thread.then(|| sampler.threads_utilization()),
            })
            .collect();
        report.samples.push(UsageSample { sample, cpus });
    }
    report
}

fn percent(value: f64) -> String {
    if value == UTILIZATION_UNAVAILABLE {
        "n/a".to_string()
    } else {
        format!("{:.1}%", value * 100.0)
    }
}

/// Renders the report as a plain-text table.
pub fn render_table(report: &UsageReport) -> String {
    let mut out = String::new();
    for sample in &report.samples {
        writeln!(out, "Sample {}", sample.sample).ok();
        for cpu in &sample.cpus {
            writeln!(
                out,
                "  CPU {:<4} {:<40} {:>7}",
                cpu.id,
                cpu.model_name,
                percent(cpu.utilization)
            )
            .ok();
            if let Some(threads) = &cpu.threads {
                for (index, value) in threads.iter().enumerate() {
                    writeln!(out, "    thread {:<4} {:>7}", index, percent(*value)).ok();
                }
            }
        }
    }
    out
}

/// Samples CPU utilization
pub fn command_usage(
    sources: &Sources,
    samples: usize,
    warm_up: Duration,
    interval: Duration,
    per_thread: bool,
    format: OutputFormat,
) -> Result<()> {
    let cpus = get_all_cpus_from(sources);
    if cpus.is_empty() {
        warn!("No CPUs detected, nothing to sample");
    }

    let mut samplers: Vec<_> = cpus
        .iter()
        .map(|cpu| {
            (cpu.id, cpu.model_name.clone(), cpu.utilization_sampler(sources))
        })
        .collect();

    info!(
        "Sampling {} CPUs: {} samples, interval {:?}",
        samplers.len(),
        samples,
        interval
    );
    let report = collect_samples(&mut samplers, samples, warm_up, interval, per_thread);

    match render(&report, format)? {
        Some(output) => println!("{output}"),
        None => print!("{}", render_table(&report)),
    }
    Ok(())
}
