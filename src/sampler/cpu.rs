use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{SAMPLE_FAILED, Sampler};
use crate::environment::RuntimeEnvironment;
use crate::error::ResultOkLogExt;
use crate::fsutil;
use crate::stats::{CgroupCpuStat, KeyValueStat, ProcCpuTimes, SingleLineStat};

/// Host-wide CPU time accounting, relative to the root filesystem.
const PROC_STAT: &str = "proc/stat";
/// CPU usage of the cgroup the process runs in, relative to the root filesystem.
const CGROUP_CPU_STAT: &str = "sys/fs/cgroup/cpu.stat";

/// Length of the observation window between the two readings.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// How CPU utilization is measured.
///
/// Chosen once at startup and kept for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStrategy {
    /// Busy share of all CPU time from `/proc/stat`.
    Host,
    /// Cgroup CPU usage from `cpu.stat`, normalised by the visible core count.
    Cgroup,
}

impl CpuStrategy {
    /// Uses cgroup accounting only inside a container whose cgroup exposes `cpu.stat`.
    pub fn select(env: RuntimeEnvironment, rootfs: impl AsRef<Path>) -> Self {
        if env.is_container() && rootfs.as_ref().join(CGROUP_CPU_STAT).is_file() {
            CpuStrategy::Cgroup
        } else {
            CpuStrategy::Host
        }
    }
}

impl fmt::Display for CpuStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuStrategy::Host => f.write_str("/proc/stat"),
            CpuStrategy::Cgroup => f.write_str("cgroup cpu.stat"),
        }
    }
}

/// Measures CPU utilization over a short blocking observation window.
///
/// Each call to [`Sampler::sample`] reads its source, sleeps for the interval, and
/// reads again. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct CpuSampler {
    strategy: CpuStrategy,
    proc_stat: PathBuf,
    cgroup_cpu_stat: PathBuf,
    interval: Duration,
    core_count: u32,
}

impl CpuSampler {
    pub fn new(strategy: CpuStrategy, rootfs: impl AsRef<Path>) -> Self {
        let rootfs = rootfs.as_ref();
        Self {
            strategy,
            proc_stat: rootfs.join(PROC_STAT),
            cgroup_cpu_stat: rootfs.join(CGROUP_CPU_STAT),
            interval: DEFAULT_INTERVAL,
            core_count: online_cores(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_core_count(mut self, core_count: u32) -> Self {
        self.core_count = core_count;
        self
    }

    pub fn strategy(&self) -> CpuStrategy {
        self.strategy
    }

    fn sample_host(&self) -> i32 {
        let Some(start) = read_stat(&self.proc_stat, ProcCpuTimes::from_reader) else {
            return SAMPLE_FAILED;
        };
        std::thread::sleep(self.interval);
        let Some(end) = read_stat(&self.proc_stat, ProcCpuTimes::from_reader) else {
            return SAMPLE_FAILED;
        };

        host_usage_percent(&start, &end)
    }

    fn sample_cgroup(&self) -> i32 {
        let Some(start) = read_stat(&self.cgroup_cpu_stat, CgroupCpuStat::from_reader) else {
            log::warn!("cgroup cpu.stat unreadable, falling back to /proc/stat");
            return self.sample_host();
        };
        std::thread::sleep(self.interval);
        let Some(end) = read_stat(&self.cgroup_cpu_stat, CgroupCpuStat::from_reader) else {
            return SAMPLE_FAILED;
        };

        cgroup_usage_percent(
            end.usage_usec.saturating_sub(start.usage_usec),
            self.interval,
            self.core_count,
        )
    }
}

impl Sampler for CpuSampler {
    fn sample(&self) -> i32 {
        match self.strategy {
            CpuStrategy::Host => self.sample_host(),
            CpuStrategy::Cgroup => self.sample_cgroup(),
        }
    }
}

/// Opens `path` and applies `parse`, logging and swallowing any failure.
fn read_stat<T>(
    path: &Path,
    parse: impl FnOnce(&mut BufReader<File>) -> std::io::Result<T>,
) -> Option<T> {
    let mut reader = fsutil::open_file_reader(path).ok_log()?;
    parse(&mut reader)
        .inspect_err(|err| log::error!("failed to parse `{}`: {err}", path.display()))
        .ok()
}

/// Busy share of the CPU time that elapsed between two `/proc/stat` readings.
///
/// Returns 0 when no time elapsed.
pub fn host_usage_percent(start: &ProcCpuTimes, end: &ProcCpuTimes) -> i32 {
    let total = end.total().saturating_sub(start.total());
    if total == 0 {
        return 0;
    }
    let idle = end.idle_total().saturating_sub(start.idle_total());
    let busy = total.saturating_sub(idle);

    (u128::from(busy) * 100 / u128::from(total)) as i32
}

/// Cgroup CPU usage over `interval` as a share of all visible cores, capped at 100.
///
/// Returns 0 for an empty interval or no cores.
pub fn cgroup_usage_percent(usage_delta_usec: u64, interval: Duration, core_count: u32) -> i32 {
    let capacity_usec = interval.as_micros() * u128::from(core_count);
    if capacity_usec == 0 {
        return 0;
    }

    (u128::from(usage_delta_usec) * 100 / capacity_usec).min(100) as i32
}

/// Number of processors currently online on the host.
///
/// Cgroup CPU quotas are not taken into account.
fn online_cores() -> u32 {
    // SAFETY: sysconf has no preconditions.
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online > 0 {
        return online as u32;
    }

    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
