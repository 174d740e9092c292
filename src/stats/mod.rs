//! Typed views of the kernel statistics sources the samplers read.
//!
//! | Source                         | Type              |
//! |--------------------------------|-------------------|
//! | `/proc/meminfo`                | [`MemInfo`]       |
//! | `/proc/stat` (`cpu` line)      | [`ProcCpuTimes`]  |
//! | `/sys/fs/cgroup/cpu.stat`      | [`CgroupCpuStat`] |
//!
//! Parsers work on any [`std::io::BufRead`], so tests feed them string fixtures.

mod cpu;
mod error;
mod memory;
mod parser;

pub use cpu::{CgroupCpuStat, ProcCpuTimes};
pub use error::StatParseError;
pub use memory::{MemInfo, percent_used};
pub use parser::{KeyValueStat, SingleLineStat};
