use std::fmt;
use std::path::Path;

use super::checks::{
    has_cgroup_v2_cpu_quota, has_docker_env_marker, has_systemd_container_marker,
    matches_container_cgroup,
};

/// Available runtime environments for the vitals service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running directly on the host.
    Host,
    /// Running inside a containerized environment (e.g., Docker, LXC, OCI runtimes).
    Container,
}

impl RuntimeEnvironment {
    pub fn is_container(self) -> bool {
        matches!(self, RuntimeEnvironment::Container)
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEnvironment::Host => f.write_str("host"),
            RuntimeEnvironment::Container => f.write_str("container"),
        }
    }
}

/// Detects whether the current system is running in a container or on the host.
///
/// The checks run in order and stop at the first positive:
///
/// 1. `/run/systemd/container` names a known container runtime.
/// 2. `/.dockerenv` exists.
/// 3. `/sys/fs/cgroup/cpu.max` reports anything but an unlimited quota.
/// 4. `/proc/1/cgroup` references a container cgroup path.
///
/// Missing files count as a negative answer. Other errors are logged as warnings and
/// do **not** cause this function to fail.
///
/// # Arguments
///
/// * `rootfs` - A path to the root filesystem to inspect (`/` in production).
///
/// # Returns
///
/// A [`RuntimeEnvironment`] indicating whether the environment is a [`Host`] or [`Container`].
///
/// [`Host`]: RuntimeEnvironment::Host
/// [`Container`]: RuntimeEnvironment::Container
pub fn detect_runtime_environment(rootfs: impl AsRef<Path>) -> RuntimeEnvironment {
    let rootfs = rootfs.as_ref();
    let checks: [(&str, fn(&Path) -> super::Result<bool>); 4] = [
        ("systemd container marker", |p| has_systemd_container_marker(p)),
        ("docker env marker", |p| has_docker_env_marker(p)),
        ("cgroup v2 cpu quota", |p| has_cgroup_v2_cpu_quota(p)),
        ("cgroup v1 membership", |p| matches_container_cgroup(p)),
    ];

    for (name, check) in checks {
        match check(rootfs) {
            Ok(true) => {
                log::debug!("Container detected by {name} check");
                return RuntimeEnvironment::Container;
            }
            Ok(false) => {}
            Err(err) => log::warn!("{name} check failed during runtime detection: {err}"),
        }
    }

    RuntimeEnvironment::Host
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::checks::{
        CGROUP_V2_CPU_MAX, DOCKER_ENV_MARKER, INIT_CGROUP, SYSTEMD_CONTAINER_MARKER,
    };

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_detect_systemd_docker_marker() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), SYSTEMD_CONTAINER_MARKER, "docker\n");
        assert_eq!(
            detect_runtime_environment(root.path()),
            RuntimeEnvironment::Container
        );
    }

    #[test]
    fn test_detect_empty_root_is_host() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            detect_runtime_environment(root.path()),
            RuntimeEnvironment::Host
        );
    }

    #[test]
    fn test_detect_host_like_tree() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), CGROUP_V2_CPU_MAX, "max 100000\n");
        write(root.path(), INIT_CGROUP, "0::/init.scope\n");
        assert_eq!(
            detect_runtime_environment(root.path()),
            RuntimeEnvironment::Host
        );
    }

    #[test]
    fn test_detect_later_checks() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), DOCKER_ENV_MARKER, "");
        assert!(detect_runtime_environment(root.path()).is_container());

        let root = tempfile::tempdir().unwrap();
        write(root.path(), CGROUP_V2_CPU_MAX, "50000 100000\n");
        assert!(detect_runtime_environment(root.path()).is_container());

        let root = tempfile::tempdir().unwrap();
        write(root.path(), INIT_CGROUP, "4:cpu:/docker/abc\n");
        assert!(detect_runtime_environment(root.path()).is_container());
    }

    #[test]
    fn test_display() {
        assert_eq!(RuntimeEnvironment::Host.to_string(), "host");
        assert_eq!(RuntimeEnvironment::Container.to_string(), "container");
    }
}
