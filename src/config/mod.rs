//! Process-wide configuration, built once at startup and read-only afterwards.
//!
//! [`Args`] holds the raw flags; [`Config::try_from`] validates them. Any validation
//! failure is fatal and reported before the listener binds.
mod args;
mod error;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub use args::Args;
pub use error::{Error, Result};

use crate::security::{IpNetwork, parse_allowlist};

/// Percent thresholds at or above which a metric is reported as failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub mem: u8,
    pub disk: u8,
    pub cpu: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            mem: 90,
            disk: 80,
            cpu: 90,
        }
    }
}

/// Admission settings for the [`AccessGate`](crate::security::AccessGate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Shared secret expected in `X-API-Key`; `None` disables the check.
    pub api_key: Option<String>,
    /// Networks allowed to call the service; empty allows everyone.
    pub allowed_networks: Vec<IpNetwork>,
    /// Requests per client and minute; `0` disables rate limiting.
    pub rate_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub security: SecurityConfig,
    /// Address the HTTP listener binds to.
    pub listen: SocketAddr,
    /// Root of the filesystem whose `/proc`, `/sys` and mount are sampled.
    pub rootfs: PathBuf,
}

fn threshold(flag: &'static str, value: i64) -> Result<u8> {
    match u8::try_from(value) {
        Ok(percent @ 1..=100) => Ok(percent),
        _ => Err(Error::InvalidThreshold { flag, value }),
    }
}

impl TryFrom<Args> for Config {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let thresholds = ThresholdConfig {
            mem: threshold("mem", args.mem)?,
            disk: threshold("disk", args.disk)?,
            cpu: threshold("cpu", args.cpu)?,
        };

        let port = match u16::try_from(args.port) {
            Ok(port) if port > 0 => port,
            _ => return Err(Error::InvalidPort(args.port)),
        };
        if args.ratelimit < 0 {
            return Err(Error::InvalidRateLimit(args.ratelimit));
        }
        let bind = args
            .bind
            .trim()
            .parse::<IpAddr>()
            .map_err(|source| Error::InvalidBindAddress {
                value: args.bind.clone(),
                source,
            })?;

        let security = SecurityConfig {
            api_key: Some(args.key).filter(|key| !key.is_empty()),
            allowed_networks: parse_allowlist(&args.allow)?,
            rate_limit: u32::try_from(args.ratelimit).unwrap_or(u32::MAX),
        };

        Ok(Self {
            thresholds,
            security,
            listen: SocketAddr::new(bind, port),
            rootfs: args.rootfs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(flags: &[&str]) -> Result<Config> {
        let args = Args::try_parse_from(std::iter::once("vitals-glimpse").chain(flags.iter().copied()))
            .unwrap();
        Config::try_from(args)
    }

    #[test]
    fn test_default_config() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.listen, "0.0.0.0:10321".parse().unwrap());
        assert_eq!(config.security.api_key, None);
        assert!(config.security.allowed_networks.is_empty());
        assert_eq!(config.security.rate_limit, 60);
        assert_eq!(config.rootfs, PathBuf::from("/"));
    }

    #[test]
    fn test_full_config() {
        let config = parse(&[
            "--mem", "50", "--disk", "100", "--cpu", "1", "--port", "65535", "--bind", "::1",
            "--key", "abc", "--allow", "10.0.0.0/24, 192.168.1.9", "--ratelimit", "0",
        ])
        .unwrap();
        assert_eq!(
            config.thresholds,
            ThresholdConfig {
                mem: 50,
                disk: 100,
                cpu: 1
            }
        );
        assert_eq!(config.listen, "[::1]:65535".parse().unwrap());
        assert_eq!(config.security.api_key.as_deref(), Some("abc"));
        assert_eq!(config.security.allowed_networks.len(), 2);
        assert_eq!(config.security.rate_limit, 0);
    }

    #[test]
    fn test_threshold_out_of_range() {
        for (flag, value) in [("--mem", "0"), ("--disk", "101"), ("--cpu", "-5")] {
            let err = parse(&[flag, value]).unwrap_err();
            assert!(matches!(err, Error::InvalidThreshold { .. }), "{flag} {value}");
            assert!(err.to_string().contains(flag), "{err}");
        }
    }

    #[test]
    fn test_port_out_of_range() {
        assert!(matches!(parse(&["--port", "0"]), Err(Error::InvalidPort(0))));
        assert!(matches!(
            parse(&["--port", "65536"]),
            Err(Error::InvalidPort(65536))
        ));
    }

    #[test]
    fn test_negative_rate_limit() {
        let err = parse(&["--ratelimit", "-1"]).unwrap_err();
        assert!(matches!(err, Error::InvalidRateLimit(-1)));
        assert_eq!(
            err.to_string(),
            "invalid --ratelimit value -1: must be >= 0"
        );
    }

    #[test]
    fn test_invalid_cidr_is_fatal() {
        let err = parse(&["--allow", "10.0.0.0/24,10.0.0.0/99"]).unwrap_err();
        assert!(matches!(err, Error::InvalidNetwork(_)));
        assert!(err.to_string().contains("10.0.0.0/99"), "{err}");
    }

    #[test]
    fn test_stray_comma_in_allowlist_is_fatal() {
        assert!(matches!(
            parse(&["--allow", "10.0.0.0/8,,"]),
            Err(Error::InvalidNetwork(_))
        ));
    }

    #[test]
    fn test_invalid_bind_address() {
        assert!(matches!(
            parse(&["--bind", "localhost"]),
            Err(Error::InvalidBindAddress { .. })
        ));
    }
}
