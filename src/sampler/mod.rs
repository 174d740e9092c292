//! Point-in-time measurements of memory, disk, and CPU utilization.
//!
//! Every sampler reports an integer percentage in `[0, 100]`. A sampler that cannot
//! read its source logs the cause and reports [`SAMPLE_FAILED`] instead; failures are
//! never retried and never propagated.

mod cpu;
mod disk;
mod memory;

pub use cpu::{CpuSampler, CpuStrategy};
pub use disk::{DiskSampler, FsUsage};
pub use memory::MemorySampler;

/// Sentinel reported by a sampler whose source could not be read.
pub const SAMPLE_FAILED: i32 = -1;

/// A source of a single utilization percentage.
///
/// Implementations may block; callers run them off the async executor.
pub trait Sampler: Send + Sync {
    /// Returns the current utilization in percent, or [`SAMPLE_FAILED`].
    fn sample(&self) -> i32;
}

/// A sampler that always reports the same value.
///
/// Useful for wiring tests of everything downstream of the kernel sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSampler(pub i32);

impl Sampler for FixedSampler {
    fn sample(&self) -> i32 {
        self.0
    }
}
