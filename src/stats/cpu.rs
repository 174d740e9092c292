//! Parsers for CPU time accounting sources.
//!
//! - [`ProcCpuTimes`]: the aggregate `cpu` line of `/proc/stat`, in clock ticks.
//! - [`CgroupCpuStat`]: the cgroup v2 `cpu.stat` key-value file, in microseconds.
//!
//! # Examples
//!
//! ```rust
//! use vitals_glimpse::stats::{CgroupCpuStat, KeyValueStat, ProcCpuTimes, SingleLineStat};
//!
//! let times = ProcCpuTimes::from_reader(&mut "cpu  10 0 5 80 5 0 0 0 0 0\n".as_bytes()).unwrap();
//! assert_eq!(times.total(), 100);
//! assert_eq!(times.idle_total(), 85);
//!
//! let stat = CgroupCpuStat::from_reader(&mut "usage_usec 1000000\n".as_bytes()).unwrap();
//! assert_eq!(stat.usage_usec, 1_000_000);
//! ```

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::{KeyValueStat, SingleLineStat, StatParseError};

/// Aggregate CPU time accounting from the `cpu` line of `/proc/stat`.
///
/// All values are cumulative clock ticks since boot. Guest time is already folded into
/// `user`/`nice` by the kernel and is therefore not tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcCpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl ProcCpuTimes {
    /// Time spent doing nothing, including waiting on I/O.
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    /// Sum of all eight accounted fields.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

const PROC_CPU_FIELDS: [&str; 8] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal",
];

/// The first four fields exist on every kernel; the rest were added over time.
const PROC_CPU_REQUIRED_FIELDS: usize = 4;

impl SingleLineStat for ProcCpuTimes {
    /// Scans `/proc/stat` for the aggregate `cpu` line and parses its fields.
    ///
    /// Per-core lines (`cpu0`, `cpu1`, ...) are skipped. Fields beyond `idle` that an
    /// older kernel does not report are treated as zero.
    ///
    /// # Errors
    ///
    /// * [`StatParseError::MissingField`] if no aggregate line exists or it is truncated.
    /// * [`StatParseError::InvalidKeyValue`] if a field is not a number.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            if parts.next() != Some("cpu") {
                line.clear();
                continue;
            }

            let mut values = [0u64; 8];
            let mut parsed = 0;
            for (slot, (field, raw)) in values
                .iter_mut()
                .zip(PROC_CPU_FIELDS.iter().zip(parts))
            {
                *slot = raw
                    .parse::<u64>()
                    .map_err(|source| StatParseError::InvalidKeyValue {
                        key: (*field).to_string(),
                        value: raw.to_string(),
                        line: lineno,
                        source,
                    })?;
                parsed += 1;
            }
            if parsed < PROC_CPU_REQUIRED_FIELDS {
                return Err(StatParseError::MissingField {
                    field: PROC_CPU_FIELDS[parsed],
                    line: lineno,
                }
                .into());
            }

            let [user, nice, system, idle, iowait, irq, softirq, steal] = values;
            return Ok(Self {
                user,
                nice,
                system,
                idle,
                iowait,
                irq,
                softirq,
                steal,
            });
        }

        Err(StatParseError::MissingField {
            field: "cpu",
            line: lineno,
        }
        .into())
    }
}

/// CPU usage of a cgroup as reported by its `cpu.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CgroupCpuStat {
    /// Cumulative CPU time of the cgroup in microseconds.
    pub usage_usec: u64,
}

type Setter = fn(&mut CgroupCpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(1);

    m.insert("usage_usec", |s, v| s.usage_usec = v);

    m
});

impl KeyValueStat for CgroupCpuStat {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
