use std::path::{Path, PathBuf};

use super::{SAMPLE_FAILED, Sampler};
use crate::error::ResultOkLogExt;
use crate::fsutil;
use crate::stats::{KeyValueStat, MemInfo};

/// Location of the kernel memory statistics relative to the root filesystem.
const MEMINFO: &str = "proc/meminfo";

/// Reports the share of memory that is not available to new workloads.
///
/// Uses `MemAvailable`, which already accounts for reclaimable page cache, so the
/// result tracks the working set rather than raw free memory.
#[derive(Debug, Clone)]
pub struct MemorySampler {
    meminfo: PathBuf,
}

impl MemorySampler {
    /// Creates a sampler reading `<rootfs>/proc/meminfo`.
    pub fn new(rootfs: impl AsRef<Path>) -> Self {
        Self {
            meminfo: rootfs.as_ref().join(MEMINFO),
        }
    }

    fn read_meminfo(&self) -> Option<MemInfo> {
        let mut reader = fsutil::open_file_reader(&self.meminfo).ok_log()?;
        MemInfo::from_reader(&mut reader)
            .inspect_err(|err| log::error!("failed to parse `{}`: {err}", self.meminfo.display()))
            .ok()
    }
}

impl Sampler for MemorySampler {
    fn sample(&self) -> i32 {
        let Some(info) = self.read_meminfo() else {
            return SAMPLE_FAILED;
        };

        info.used_percent().unwrap_or_else(|| {
            log::error!("`{}` reports zero total memory", self.meminfo.display());
            SAMPLE_FAILED
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rootfs_with_meminfo(content: &str) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("proc")).unwrap();
        std::fs::write(root.path().join(MEMINFO), content).unwrap();
        root
    }

    #[test]
    fn test_sample_meminfo() {
        let root = rootfs_with_meminfo(
            "MemTotal:       16318540 kB\nMemFree:         1020412 kB\nMemAvailable:   10281472 kB\n",
        );
        assert_eq!(MemorySampler::new(root.path()).sample(), 37);
    }

    #[test]
    fn test_sample_all_available() {
        let root = rootfs_with_meminfo("MemTotal: 2048 kB\nMemAvailable: 2048 kB\n");
        assert_eq!(MemorySampler::new(root.path()).sample(), 0);
    }

    #[test]
    fn test_sample_zero_total() {
        let root = rootfs_with_meminfo("MemTotal: 0 kB\nMemAvailable: 0 kB\n");
        assert_eq!(MemorySampler::new(root.path()).sample(), SAMPLE_FAILED);
    }

    #[test]
    fn test_sample_missing_source() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(MemorySampler::new(root.path()).sample(), SAMPLE_FAILED);
    }

    #[test]
    fn test_sample_garbage_source() {
        let root = rootfs_with_meminfo("MemTotal: many kB\n");
        assert_eq!(MemorySampler::new(root.path()).sample(), SAMPLE_FAILED);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_sample_live_host() {
        let percent = MemorySampler::new("/").sample();
        assert!((0..=100).contains(&percent), "got {percent}");
    }
}
