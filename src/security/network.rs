use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Errors produced while parsing a CIDR block.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid address in `{value}`: {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid prefix length in `{value}`")]
    InvalidPrefix { value: String },
}

/// An IPv4 or IPv6 network in CIDR notation.
///
/// Host bits are cleared on construction, so `10.0.0.7/24` and `10.0.0.0/24` are
/// the same network.
///
/// # Examples
///
/// ```
/// # use vitals_glimpse::security::IpNetwork;
/// let net: IpNetwork = "203.0.113.0/24".parse().unwrap();
/// assert!(net.contains("203.0.113.5".parse().unwrap()));
/// assert!(!net.contains("198.51.100.7".parse().unwrap()));
///
/// let host: IpNetwork = "2001:db8::1".parse().unwrap();
/// assert_eq!(host.to_string(), "2001:db8::1/128");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    /// Creates a network, masking off any host bits of `addr`.
    ///
    /// Returns `None` if `prefix` exceeds the address length.
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        let addr = match addr {
            IpAddr::V4(v4) if prefix <= 32 => {
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & v4_mask(prefix)))
            }
            IpAddr::V6(v6) if prefix <= 128 => {
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & v6_mask(prefix)))
            }
            _ => return None,
        };
        Some(Self { addr, prefix })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Returns true if `ip` lies inside this network.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`), as seen by dual-stack
    /// listeners, are matched against IPv4 networks.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
            v4 => v4,
        };

        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                u32::from(ip) & v4_mask(self.prefix) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                u128::from(ip) & v6_mask(self.prefix) == u128::from(net)
            }
            _ => false,
        }
    }
}

fn v4_mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

fn v6_mask(prefix: u8) -> u128 {
    u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0)
}

impl FromStr for IpNetwork {
    type Err = Error;

    /// Parses `addr/prefix`. A bare address becomes a single-host network
    /// (`/32` for IPv4, `/128` for IPv6).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };
        let addr = addr
            .parse::<IpAddr>()
            .map_err(|source| Error::InvalidAddress {
                value: s.to_owned(),
                source,
            })?;
        let prefix = match prefix {
            Some(prefix) => prefix.parse::<u8>().map_err(|_| Error::InvalidPrefix {
                value: s.to_owned(),
            })?,
            None if addr.is_ipv4() => 32,
            None => 128,
        };

        IpNetwork::new(addr, prefix).ok_or_else(|| Error::InvalidPrefix {
            value: s.to_owned(),
        })
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// Parses a comma-separated allowlist such as `"10.0.0.0/24, 192.168.1.7"`.
///
/// Whitespace around entries is ignored. An empty or blank list allows everyone.
///
/// # Errors
///
/// Returns the first entry that is not a valid CIDR block or address. Empty entries,
/// as left by a stray comma, are rejected too.
pub fn parse_allowlist(list: &str) -> Result<Vec<IpNetwork>, Error> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',').map(|entry| entry.trim().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_ipv4_cidr() {
        let net: IpNetwork = "10.1.2.3/16".parse().unwrap();
        assert_eq!(net.addr(), ip("10.1.0.0"));
        assert_eq!(net.prefix(), 16);
        assert_eq!(net.to_string(), "10.1.0.0/16");
    }

    #[test]
    fn test_parse_bare_addresses() {
        let v4: IpNetwork = "192.168.1.7".parse().unwrap();
        assert_eq!(v4.to_string(), "192.168.1.7/32");
        let v6: IpNetwork = "fe80::1".parse().unwrap();
        assert_eq!(v6.to_string(), "fe80::1/128");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            "10.0.0.0/33".parse::<IpNetwork>(),
            Err(Error::InvalidPrefix { .. })
        ));
        assert!(matches!(
            "2001:db8::/129".parse::<IpNetwork>(),
            Err(Error::InvalidPrefix { .. })
        ));
        assert!(matches!(
            "10.0.0.0/abc".parse::<IpNetwork>(),
            Err(Error::InvalidPrefix { .. })
        ));
        assert!(matches!(
            "not-an-ip/8".parse::<IpNetwork>(),
            Err(Error::InvalidAddress { .. })
        ));
        assert!(matches!(
            "300.1.1.1".parse::<IpNetwork>(),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_contains_ipv4() {
        let net: IpNetwork = "203.0.113.0/24".parse().unwrap();
        assert!(net.contains(ip("203.0.113.0")));
        assert!(net.contains(ip("203.0.113.5")));
        assert!(net.contains(ip("203.0.113.255")));
        assert!(!net.contains(ip("203.0.114.1")));
        assert!(!net.contains(ip("198.51.100.7")));
    }

    #[test]
    fn test_contains_ipv6() {
        let net: IpNetwork = "2001:db8::/32".parse().unwrap();
        assert!(net.contains(ip("2001:db8:1234::1")));
        assert!(!net.contains(ip("2001:db9::1")));
        assert!(!net.contains(ip("10.0.0.1")));
    }

    #[test]
    fn test_contains_ipv4_mapped() {
        let net: IpNetwork = "203.0.113.0/24".parse().unwrap();
        assert!(net.contains(ip("::ffff:203.0.113.5")));
        assert!(!net.contains(ip("::ffff:198.51.100.7")));
    }

    #[test]
    fn test_zero_prefix_matches_family() {
        let any_v4: IpNetwork = "0.0.0.0/0".parse().unwrap();
        assert!(any_v4.contains(ip("8.8.8.8")));
        assert!(!any_v4.contains(ip("2001:db8::1")));

        let any_v6: IpNetwork = "::/0".parse().unwrap();
        assert!(any_v6.contains(ip("2001:db8::1")));
    }

    #[test]
    fn test_parse_allowlist() {
        let nets = parse_allowlist(" 10.0.0.0/24,192.168.1.5 , 2001:db8::/48").unwrap();
        let rendered: Vec<String> = nets.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["10.0.0.0/24", "192.168.1.5/32", "2001:db8::/48"]
        );

        assert!(parse_allowlist("").unwrap().is_empty());
        assert!(parse_allowlist("  ").unwrap().is_empty());
        assert!(parse_allowlist("10.0.0.0/24,bogus").is_err());
    }

    #[test]
    fn test_parse_allowlist_rejects_empty_entries() {
        for list in ["10.0.0.0/8,,", "10.0.0.0/8,", ",10.0.0.0/8", "10.0.0.0/8, ,192.168.1.5"] {
            assert!(
                matches!(parse_allowlist(list), Err(Error::InvalidAddress { .. })),
                "{list:?}"
            );
        }
    }
}
