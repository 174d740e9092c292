use super::{Error, Result};
use crate::fsutil;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Marker written by systemd (and most container managers) naming the container runtime.
pub const SYSTEMD_CONTAINER_MARKER: &str = "run/systemd/container";
/// Marker file created by Docker in the root of every container.
pub const DOCKER_ENV_MARKER: &str = ".dockerenv";
/// cgroup v2 CPU bandwidth limit of the current cgroup.
pub const CGROUP_V2_CPU_MAX: &str = "sys/fs/cgroup/cpu.max";
/// cgroup v1 membership of the init process.
pub const INIT_CGROUP: &str = "proc/1/cgroup";

/// `cpu.max` content of a cgroup without a quota and with the default period.
const UNLIMITED_CPU_MAX: &str = "max 100000";

/// Runtime identifiers accepted in the systemd container marker.
const CONTAINER_RUNTIMES: [&str; 3] = ["lxc", "docker", "oci"];

/// Path segments in a cgroup v1 membership file that indicate a container.
const CONTAINER_CGROUP_SEGMENTS: [&str; 2] = ["/lxc/", "/docker/"];

/// Opens `path` for buffered reading, mapping a missing file to `Ok(None)`.
fn open_optional(path: &Path) -> Result<Option<BufReader<File>>> {
    match fsutil::open_file_reader(path) {
        Ok(reader) => Ok(Some(reader)),
        Err(err) if err.source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::FileOpen {
            path: err.path,
            source: err.source,
        }),
    }
}

/// Returns true if the systemd container marker names a known container runtime.
///
/// # Errors
///
/// * [`Error::FileOpen`] if the marker exists but cannot be opened.
/// * [`Error::ReadLine`] if reading the marker fails.
pub fn has_systemd_container_marker(rootfs: impl AsRef<Path>) -> Result<bool> {
    let path = rootfs.as_ref().join(SYSTEMD_CONTAINER_MARKER);
    let Some(mut reader) = open_optional(&path)? else {
        return Ok(false);
    };

    let mut content = String::with_capacity(16);
    reader
        .read_line(&mut content)
        .map_err(|source| Error::ReadLine { path, source })?;

    Ok(CONTAINER_RUNTIMES.contains(&content.trim()))
}

/// Returns true if the Docker marker file exists under `rootfs`.
///
/// # Errors
///
/// Returns [`Error::ExistenceCheck`] if the existence check itself fails.
pub fn has_docker_env_marker(rootfs: impl AsRef<Path>) -> Result<bool> {
    let path = rootfs.as_ref().join(DOCKER_ENV_MARKER);

    path.try_exists()
        .map_err(|source| Error::ExistenceCheck { path, source })
}

/// Returns true if the cgroup v2 `cpu.max` file does not report an unlimited quota.
///
/// Host cgroups report `max <period>`; any other content, including an empty file,
/// counts as a container signal.
///
/// # Errors
///
/// * [`Error::FileOpen`] if the file exists but cannot be opened.
/// * [`Error::ReadLine`] if reading the file fails.
pub fn has_cgroup_v2_cpu_quota(rootfs: impl AsRef<Path>) -> Result<bool> {
    let path = rootfs.as_ref().join(CGROUP_V2_CPU_MAX);
    let Some(mut reader) = open_optional(&path)? else {
        return Ok(false);
    };

    let mut content = String::with_capacity(32);
    reader
        .read_line(&mut content)
        .map_err(|source| Error::ReadLine { path, source })?;
    let content = content.trim();

    Ok(content != UNLIMITED_CPU_MAX && !content.starts_with("max "))
}

/// Returns true if the init process belongs to a container's cgroup v1 hierarchy.
///
/// # Errors
///
/// * [`Error::FileOpen`] if the file exists but cannot be opened.
/// * [`Error::ReadLine`] if a line from the file cannot be read.
pub fn matches_container_cgroup(rootfs: impl AsRef<Path>) -> Result<bool> {
    let path = rootfs.as_ref().join(INIT_CGROUP);
    let Some(mut buf) = open_optional(&path)? else {
        return Ok(false);
    };

    let mut line = String::with_capacity(256);

    while buf.read_line(&mut line).map_err(|source| Error::ReadLine {
        path: path.clone(),
        source,
    })? != 0
    {
        if CONTAINER_CGROUP_SEGMENTS
            .iter()
            .any(|segment| line.contains(segment))
        {
            return Ok(true);
        }

        line.clear();
    }

    Ok(false)
}
