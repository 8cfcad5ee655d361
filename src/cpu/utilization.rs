//! Delta-sampled CPU and per-thread utilization.
//!
//! A single [`Jiffies`] snapshot carries no utilization information; the
//! sampler keeps the previous snapshot and reports the busy share of the
//! window between it and a fresh read. The sampler is owned by the caller,
//! so concurrent use has to go through `&mut` like any other state.

use serde::Serialize;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

use super::source::Sources;
use crate::system::{read_cpu_stats, CpuStat};

/// Returned when no meaningful utilization can be computed.
pub const UTILIZATION_UNAVAILABLE: f64 = -1.0;

/// Blocking delay taken by [`UtilizationSampler::prime`] by default.
pub const DEFAULT_WARM_UP: Duration = Duration::from_secs(1);

/// Upper bound for whole-CPU utilization (a fraction).
const CPU_UTILIZATION_MAX: f64 = 1.0;

/// Upper bound for per-thread utilization.
const THREAD_UTILIZATION_MAX: f64 = 100.0;

/// Cumulative CPU time counters taken at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Jiffies {
    /// Total time units.
    pub all: u64,
    /// Non-idle time units.
    pub working: u64,
}

impl Jiffies {
    pub fn new(all: u64, working: u64) -> Self {
        Self { all, working }
    }
}

impl From<CpuStat> for Jiffies {
    fn from(stat: CpuStat) -> Self {
        Self {
            all: stat.total(),
            working: stat.working(),
        }
    }
}

/// Supplier of jiffies snapshots.
///
/// Line 0 is the whole CPU, line `i + 1` is logical thread `i`.
pub trait JiffiesSource {
    /// Reads every line at one instant.
    fn snapshot(&self) -> Option<Vec<Jiffies>>;

    /// Reads a single line.
    fn jiffies(&self, line: usize) -> Option<Jiffies> {
        self.snapshot()?.get(line).copied()
    }
}

/// Reads jiffies from `<proc>/stat`.
#[derive(Debug, Clone)]
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    pub fn new(sources: &Sources) -> Self {
        Self {
            path: sources.stat(),
        }
    }
}

impl JiffiesSource for ProcStat {
    fn snapshot(&self) -> Option<Vec<Jiffies>> {
        match read_cpu_stats(&self.path) {
            Ok(stats) => Some(stats.into_iter().map(|(_, s)| s.into()).collect()),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

fn window_ratio(last: Jiffies, current: Jiffies) -> f64 {
    let total_over_period = current.all as f64 - last.all as f64;
    let work_over_period = current.working as f64 - last.working as f64;
    work_over_period / total_over_period
}

fn bounded(value: f64, max: f64) -> f64 {
    if value.is_nan() || value < 0.0 || value > max {
        UTILIZATION_UNAVAILABLE
    } else {
        value
    }
}

/// Whole-CPU utilization over the window `last..current`, in `[0, 1]`.
///
/// A zero-width window, counter wraparound or NaN yields
/// [`UTILIZATION_UNAVAILABLE`].
pub fn utilization_between(last: Jiffies, current: Jiffies) -> f64 {
    bounded(window_ratio(last, current), CPU_UTILIZATION_MAX)
}

/// Per-thread utilization over the window `last..current`, valid in `[0, 100]`.
pub fn thread_utilization_between(last: Jiffies, current: Jiffies) -> f64 {
    bounded(window_ratio(last, current), THREAD_UTILIZATION_MAX)
}

/// Keeps the previous snapshots needed for delta-based utilization.
#[derive(Debug)]
pub struct UtilizationSampler<S = ProcStat> {
    source: S,
    warm_up: Duration,
    primed: bool,
    last_cpu: Jiffies,
    last_threads: Vec<Jiffies>,
}

impl UtilizationSampler<ProcStat> {
    /// Sampler over `<proc>/stat` for `threads` logical threads.
    pub fn from_sources(sources: &Sources, threads: usize) -> Self {
        Self::new(ProcStat::new(sources), threads)
    }
}

impl<S: JiffiesSource> UtilizationSampler<S> {
    pub fn new(source: S, threads: usize) -> Self {
        Self {
            source,
            warm_up: DEFAULT_WARM_UP,
            primed: false,
            last_cpu: Jiffies::default(),
            last_threads: vec![Jiffies::default(); threads],
        }
    }

    /// Overrides the warm-up delay taken by [`prime`](Self::prime).
    pub fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }

    pub fn threads(&self) -> usize {
        self.last_threads.len()
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Records baseline snapshots and blocks for the warm-up delay.
    ///
    /// Runs once; later calls are no-ops until [`reset`](Self::reset).
    pub fn prime(&mut self) {
        if self.primed {
            return;
        }
        debug!(
            "Priming utilization sampler: {} threads, warm-up {:?}",
            self.last_threads.len(),
            self.warm_up
        );

        self.take_baseline();
        if !self.warm_up.is_zero() {
            thread::sleep(self.warm_up);
        }
    }

    fn take_baseline(&mut self) {
        if let Some(snapshot) = self.source.snapshot() {
            self.last_cpu = snapshot.first().copied().unwrap_or_default();
            for (i, last) in self.last_threads.iter_mut().enumerate() {
                *last = snapshot.get(i + 1).copied().unwrap_or_default();
            }
        }
        self.primed = true;
    }

    /// Drops stored snapshots; the next measurement primes again.
    pub fn reset(&mut self) {
        self.primed = false;
        self.last_cpu = Jiffies::default();
        self.last_threads.fill(Jiffies::default());
    }

    /// Whole-CPU utilization since the previous call, in `[0, 1]`, or
    /// [`UTILIZATION_UNAVAILABLE`].
    pub fn cpu_utilization(&mut self) -> f64 {
        self.prime();
        let Some(current) = self.source.jiffies(0) else {
            return UTILIZATION_UNAVAILABLE;
        };

        let utilization = utilization_between(self.last_cpu, current);
        trace!(
            "CPU window {:?} -> {:?}: {}",
            self.last_cpu,
            current,
            utilization
        );
        self.last_cpu = current;
        utilization
    }

    /// Utilization of logical thread `index` since its previous sample, or
    /// [`UTILIZATION_UNAVAILABLE`].
    pub fn thread_utilization(&mut self, index: usize) -> f64 {
        self.prime();
        if index >= self.last_threads.len() {
            return UTILIZATION_UNAVAILABLE;
        }
        let Some(current) = self.source.jiffies(index + 1) else {
            return UTILIZATION_UNAVAILABLE;
        };
        self.record_thread(index, current)
    }

    /// Utilization of every logical thread, ordered by thread index.
    pub fn threads_utilization(&mut self) -> Vec<f64> {
        self.prime();
        let snapshot = self.source.snapshot().unwrap_or_default();

        (0..self.last_threads.len())
            .map(|index| match snapshot.get(index + 1) {
                Some(current) => self.record_thread(index, *current),
                None => UTILIZATION_UNAVAILABLE,
            })
            .collect()
    }

    fn record_thread(&mut self, index: usize, current: Jiffies) -> f64 {
        let last = std::mem::replace(&mut self.last_threads[index], current);
        thread_utilization_between(last, current)
    }
}

/// Primes several samplers behind a single warm-up delay.
///
/// Baselines are taken back to back and `warm_up` is slept once, whatever
/// warm-up each sampler was built with. Samplers that are already primed keep
/// their baseline; if all of them are, nothing sleeps.
pub fn prime_all<'a, S>(
    samplers: impl IntoIterator<Item = &'a mut UtilizationSampler<S>>,
    warm_up: Duration,
) where
    S: JiffiesSource + 'a,
{
    let mut primed = 0usize;
    for sampler in samplers {
        if !sampler.is_primed() {
            sampler.take_baseline();
            primed += 1;
        }
    }

    if primed > 0 && !warm_up.is_zero() {
        debug!("Primed {} samplers, warming up for {:?}", primed, warm_up);
        thread::sleep(warm_up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Hands out pre-recorded snapshots, one per read.
    struct Scripted {
        snapshots: RefCell<VecDeque<Vec<Jiffies>>>,
    }

    impl Scripted {
        fn new(snapshots: Vec<Vec<Jiffies>>) -> Self {
            Self {
                snapshots: RefCell::new(snapshots.into()),
            }
        }
    }

    impl JiffiesSource for Scripted {
        fn snapshot(&self) -> Option<Vec<Jiffies>> {
            self.snapshots.borrow_mut().pop_front()
        }
    }

    fn sampler(snapshots: Vec<Vec<Jiffies>>, threads: usize) -> UtilizationSampler<Scripted> {
        UtilizationSampler::new(Scripted::new(snapshots), threads).with_warm_up(Duration::ZERO)
    }

    #[test]
    fn test_utilization_between() {
        let last = Jiffies::new(1000, 300);
        let current = Jiffies::new(1100, 340);
        assert!((utilization_between(last, current) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_window() {
        let j = Jiffies::new(1000, 300);
        assert_eq!(utilization_between(j, j), UTILIZATION_UNAVAILABLE);
        assert_eq!(thread_utilization_between(j, j), UTILIZATION_UNAVAILABLE);
    }

    #[test]
    fn test_wraparound_is_rejected() {
        let last = Jiffies::new(1000, 300);
        let current = Jiffies::new(1100, 250);
        assert_eq!(utilization_between(last, current), UTILIZATION_UNAVAILABLE);
    }

    #[test]
    fn test_thread_range_is_wider() {
        // all went backwards, working went backwards further: ratio 2.0
        let last = Jiffies::new(1000, 500);
        let current = Jiffies::new(900, 300);
        assert_eq!(utilization_between(last, current), UTILIZATION_UNAVAILABLE);
        assert!((thread_utilization_between(last, current) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cpu_utilization_uses_primed_baseline() {
        let mut sampler = sampler(
            vec![
                vec![Jiffies::new(1000, 300)],
                vec![Jiffies::new(1100, 340)],
                vec![Jiffies::new(1300, 540)],
            ],
            0,
        );
        assert!(!sampler.is_primed());
        sampler.prime();
        assert!(sampler.is_primed());

        assert!((sampler.cpu_utilization() - 0.4).abs() < 1e-12);
        assert!((sampler.cpu_utilization() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_call_primes_lazily() {
        let mut sampler = sampler(
            vec![vec![Jiffies::new(500, 100)], vec![Jiffies::new(600, 150)]],
            0,
        );
        assert!((sampler.cpu_utilization() - 0.5).abs() < 1e-12);
        assert!(sampler.is_primed());
    }

    #[test]
    fn test_unreadable_source() {
        let mut sampler = sampler(vec![], 2);
        assert_eq!(sampler.cpu_utilization(), UTILIZATION_UNAVAILABLE);
        assert_eq!(sampler.thread_utilization(0), UTILIZATION_UNAVAILABLE);
        assert_eq!(
            sampler.threads_utilization(),
            vec![UTILIZATION_UNAVAILABLE, UTILIZATION_UNAVAILABLE]
        );
    }

    #[test]
    fn test_thread_utilization() {
        let baseline = vec![
            Jiffies::new(2000, 600),
            Jiffies::new(1000, 200),
            Jiffies::new(1000, 400),
        ];
        let next = vec![
            Jiffies::new(2200, 700),
            Jiffies::new(1100, 225),
            Jiffies::new(1100, 475),
        ];
        let mut sampler = sampler(vec![baseline, next], 2);
        sampler.prime();

        let values = sampler.threads_utilization();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 0.25).abs() < 1e-12);
        assert!((values[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_prime_all_shares_one_warm_up() {
        // default warm-up on each sampler would block for a second apiece
        let mut samplers = vec![
            UtilizationSampler::new(
                Scripted::new(vec![vec![Jiffies::new(100, 10)], vec![Jiffies::new(200, 60)]]),
                0,
            ),
            UtilizationSampler::new(
                Scripted::new(vec![vec![Jiffies::new(100, 10)], vec![Jiffies::new(200, 10)]]),
                0,
            ),
        ];

        let start = std::time::Instant::now();
        prime_all(samplers.iter_mut(), Duration::ZERO);
        assert!(start.elapsed() < DEFAULT_WARM_UP);
        assert!(samplers.iter().all(|s| s.is_primed()));

        assert!((samplers[0].cpu_utilization() - 0.5).abs() < 1e-12);
        assert_eq!(samplers[1].cpu_utilization(), 0.0);
    }

    #[test]
    fn test_prime_all_keeps_existing_baseline() {
        let mut primed = sampler(
            vec![
                vec![Jiffies::new(100, 10)],
                vec![Jiffies::new(300, 110)],
            ],
            0,
        );
        primed.prime();
        prime_all(std::iter::once(&mut primed), Duration::ZERO);
        assert!((primed.cpu_utilization() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_thread_index_out_of_range() {
        let mut sampler = sampler(vec![vec![Jiffies::default(); 3]], 2);
        assert_eq!(sampler.thread_utilization(2), UTILIZATION_UNAVAILABLE);
    }

    #[test]
    fn test_missing_thread_line() {
        let mut sampler = sampler(
            vec![
                vec![Jiffies::new(10, 5), Jiffies::new(10, 5)],
                vec![Jiffies::new(20, 10), Jiffies::new(20, 10)],
            ],
            2,
        );
        sampler.prime();
        let values = sampler.threads_utilization();
        assert!((values[0] - 0.5).abs() < 1e-12);
        assert_eq!(values[1], UTILIZATION_UNAVAILABLE);
    }

    #[test]
    fn test_reset_requires_new_baseline() {
        let mut sampler = sampler(
            vec![
                vec![Jiffies::new(100, 50)],
                vec![Jiffies::new(200, 60)],
                vec![Jiffies::new(1000, 500)],
                vec![Jiffies::new(1100, 600)],
            ],
            0,
        );
        sampler.prime();
        assert!((sampler.cpu_utilization() - 0.1).abs() < 1e-12);

        sampler.reset();
        assert!(!sampler.is_primed());
        assert!((sampler.cpu_utilization() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_jiffies_from_cpu_stat() {
        let stat = CpuStat {
            user: 100,
            nice: 5,
            system: 50,
            idle: 800,
            iowait: 20,
            irq: 3,
            softirq: 2,
            steal: 1,
        };
        assert_eq!(Jiffies::from(stat), Jiffies::new(981, 161));
    }
}
