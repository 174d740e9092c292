//! Parser for the kernel memory statistics in `/proc/meminfo`.
//!
//! Each line has the form `Key:   <value> kB`. Only the fields needed to derive a
//! working-set estimate are kept.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::KeyValueStat;

/// Memory totals from `/proc/meminfo`, in kibibytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemInfo {
    /// Total usable RAM.
    pub total_kb: u64,
    /// Estimate of memory available for new workloads without swapping,
    /// including reclaimable page cache.
    pub available_kb: u64,
}

impl MemInfo {
    /// Percentage of memory in use, derived from the available estimate.
    ///
    /// Returns `None` if `total_kb` is zero.
    pub fn used_percent(&self) -> Option<i32> {
        percent_used(self.available_kb, self.total_kb)
    }
}

/// Computes `100 - floor(available * 100 / total)`, clamped to `[0, 100]`.
///
/// Returns `None` if `total` is zero.
pub fn percent_used(available: u64, total: u64) -> Option<i32> {
    if total == 0 {
        return None;
    }
    let available_percent = (u128::from(available) * 100 / u128::from(total)).min(100);
    Some(100 - available_percent as i32)
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);

    m.insert("MemTotal:", |s, v| s.total_kb = v);
    m.insert("MemAvailable:", |s, v| s.available_kb = v);

    m
});

impl KeyValueStat for MemInfo {
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
