use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::{SAMPLE_FAILED, Sampler};
use crate::stats::percent_used;

/// Block counts of a mounted filesystem, as reported by `statvfs(3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsUsage {
    /// Total data blocks in the filesystem.
    pub blocks: u64,
    /// Free blocks available to unprivileged users.
    pub blocks_available: u64,
}

impl FsUsage {
    /// Queries the filesystem containing `path`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the path contains a NUL byte or `statvfs` fails.
    #[allow(clippy::unnecessary_cast)]
    pub fn query(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let c_path = CString::new(path.as_ref().as_os_str().as_bytes())
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

        // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a plain C
        // struct the kernel fully initialises on success.
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if ret != 0 {
            return Err(std::io::Error::last_os_error());
        }

        Ok(Self {
            blocks: stat.f_blocks as u64,
            blocks_available: stat.f_bavail as u64,
        })
    }

    /// Percentage of blocks not available to unprivileged users.
    ///
    /// Blocks reserved for root count as used. Returns `None` if `blocks` is zero.
    pub fn used_percent(&self) -> Option<i32> {
        percent_used(self.blocks_available, self.blocks)
    }
}

/// Reports how full the filesystem mounted at the root is.
#[derive(Debug, Clone)]
pub struct DiskSampler {
    mount_point: PathBuf,
}

impl DiskSampler {
    /// Creates a sampler for the filesystem mounted at `mount_point`.
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }
}

impl Sampler for DiskSampler {
    fn sample(&self) -> i32 {
        let usage = match FsUsage::query(&self.mount_point) {
            Ok(usage) => usage,
            Err(err) => {
                log::error!(
                    "failed to fetch filesystem statistics for `{}`: {err}",
                    self.mount_point.display()
                );
                return SAMPLE_FAILED;
            }
        };

        usage.used_percent().unwrap_or_else(|| {
            log::warn!(
                "total blocks of `{}` unexpectedly zero",
                self.mount_point.display()
            );
            SAMPLE_FAILED
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_percent() {
        let usage = FsUsage {
            blocks: 1000,
            blocks_available: 850,
        };
        assert_eq!(usage.used_percent(), Some(15));

        let full = FsUsage {
            blocks: 1000,
            blocks_available: 0,
        };
        assert_eq!(full.used_percent(), Some(100));
    }

    #[test]
    fn test_used_percent_zero_total() {
        assert_eq!(FsUsage::default().used_percent(), None);
    }

    #[test]
    fn test_query_root() {
        let usage = FsUsage::query("/").unwrap();
        assert!(usage.blocks_available <= usage.blocks);
    }

    #[test]
    fn test_sample_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let percent = DiskSampler::new(dir.path()).sample();
        assert!((0..=100).contains(&percent), "got {percent}");
    }

    #[test]
    fn test_sample_missing_mount_point() {
        let dir = tempfile::tempdir().unwrap();
        let sampler = DiskSampler::new(dir.path().join("does/not/exist"));
        assert_eq!(sampler.sample(), SAMPLE_FAILED);
    }

    #[test]
    fn test_query_rejects_nul_byte() {
        let err = FsUsage::query("/tmp/\0bad").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
