use std::path::PathBuf;

/// Command-line flags of the vitals service.
///
/// Numeric values are accepted as plain integers here and range-checked when
/// converted into a [`Config`](super::Config), so out-of-range input produces a
/// message naming the flag.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "vitals-glimpse", version, about = "Memory, disk and CPU vitals over HTTP")]
pub struct Args {
    /// Memory usage threshold percent
    #[arg(long, env = "VITALS_MEM", default_value_t = 90, allow_negative_numbers = true)]
    pub mem: i64,

    /// Disk usage threshold percent
    #[arg(long, env = "VITALS_DISK", default_value_t = 80, allow_negative_numbers = true)]
    pub disk: i64,

    /// CPU usage threshold percent
    #[arg(long, env = "VITALS_CPU", default_value_t = 90, allow_negative_numbers = true)]
    pub cpu: i64,

    /// Server port
    #[arg(long, env = "VITALS_PORT", default_value_t = 10321, allow_negative_numbers = true)]
    pub port: i64,

    /// Address to bind to
    #[arg(long, env = "VITALS_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// API key required via the X-API-Key header (empty disables the check)
    #[arg(long, env = "VITALS_API_KEY", default_value = "", hide_env_values = true)]
    pub key: String,

    /// Comma-separated CIDR allowlist (e.g. "10.0.0.0/24,192.168.1.0/24")
    #[arg(long, env = "VITALS_ALLOW", default_value = "")]
    pub allow: String,

    /// Max requests per IP per minute (0 to disable)
    #[arg(long, env = "VITALS_RATELIMIT", default_value_t = 60, allow_negative_numbers = true)]
    pub ratelimit: i64,

    /// Root of the filesystem holding /proc and /sys
    #[arg(long, env = "VITALS_ROOTFS", default_value = "/")]
    pub rootfs: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["vitals-glimpse"]).unwrap();
        assert_eq!(args.mem, 90);
        assert_eq!(args.disk, 80);
        assert_eq!(args.cpu, 90);
        assert_eq!(args.port, 10321);
        assert_eq!(args.bind, "0.0.0.0");
        assert_eq!(args.key, "");
        assert_eq!(args.allow, "");
        assert_eq!(args.ratelimit, 60);
        assert_eq!(args.rootfs, PathBuf::from("/"));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "vitals-glimpse",
            "--mem",
            "75",
            "--port",
            "8080",
            "--key",
            "hunter2",
            "--allow",
            "10.0.0.0/8",
            "--ratelimit",
            "-1",
        ])
        .unwrap();
        assert_eq!(args.mem, 75);
        assert_eq!(args.port, 8080);
        assert_eq!(args.key, "hunter2");
        assert_eq!(args.allow, "10.0.0.0/8");
        assert_eq!(args.ratelimit, -1);
    }

    #[test]
    fn test_non_numeric_threshold() {
        assert!(Args::try_parse_from(["vitals-glimpse", "--cpu", "lots"]).is_err());
    }

    #[test]
    fn test_clap_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
