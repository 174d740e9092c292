use std::fmt;
use std::net::IpAddr;

use super::{IpNetwork, RateLimiter};
use crate::config::SecurityConfig;

/// Reason a request was turned away by the [`AccessGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The caller's address is outside every allowlisted network.
    Forbidden,
    /// The caller exceeded its requests for the current minute.
    TooManyRequests,
    /// The API key was missing or wrong.
    Unauthorized,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::Forbidden => f.write_str("Forbidden"),
            Denial::TooManyRequests => f.write_str("Too Many Requests"),
            Denial::Unauthorized => f.write_str("Unauthorized"),
        }
    }
}

/// Admission pipeline in front of the vitals endpoint.
///
/// Stages run in a fixed order and the first failing stage decides the outcome:
///
/// 1. allowlist: callers outside every configured network are [`Denial::Forbidden`].
/// 2. rate limit: skipped for allowlisted callers, otherwise [`Denial::TooManyRequests`].
/// 3. API key: [`Denial::Unauthorized`] unless the supplied key matches exactly.
///
/// Unconfigured stages pass every request.
#[derive(Debug)]
pub struct AccessGate {
    allowed_networks: Vec<IpNetwork>,
    rate_limiter: Option<RateLimiter>,
    api_key: Option<Vec<u8>>,
}

impl AccessGate {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            allowed_networks: config.allowed_networks.clone(),
            rate_limiter: (config.rate_limit > 0).then(|| RateLimiter::new(config.rate_limit)),
            api_key: config.api_key.as_ref().map(|key| key.as_bytes().to_vec()),
        }
    }

    /// Runs all stages for a request from `peer` carrying `api_key`.
    pub fn check(&self, peer: IpAddr, api_key: Option<&[u8]>) -> Result<(), Denial> {
        let allowlisted = self.check_allowlist(peer)?;
        if !allowlisted {
            self.check_rate_limit(peer)?;
        }
        self.check_api_key(api_key)
    }

    /// Returns whether `peer` matched an allowlisted network.
    fn check_allowlist(&self, peer: IpAddr) -> Result<bool, Denial> {
        if self.allowed_networks.is_empty() {
            return Ok(false);
        }
        if self.allowed_networks.iter().any(|net| net.contains(peer)) {
            Ok(true)
        } else {
            Err(Denial::Forbidden)
        }
    }

    fn check_rate_limit(&self, peer: IpAddr) -> Result<(), Denial> {
        match &self.rate_limiter {
            Some(limiter) if !limiter.allow(peer) => Err(Denial::TooManyRequests),
            _ => Ok(()),
        }
    }

    fn check_api_key(&self, supplied: Option<&[u8]>) -> Result<(), Denial> {
        let Some(expected) = &self.api_key else {
            return Ok(());
        };
        match supplied {
            Some(supplied) if constant_time_eq(supplied, expected) => Ok(()),
            _ => Err(Denial::Unauthorized),
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn allowed_networks(&self) -> &[IpNetwork] {
        &self.allowed_networks
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }
}

/// Compares two byte strings in time that depends only on `expected`'s length.
///
/// Every byte of `expected` is inspected regardless of where the inputs first
/// differ; a length mismatch is folded into the result instead of returning early.
pub fn constant_time_eq(supplied: &[u8], expected: &[u8]) -> bool {
    let mut diff = u8::from(supplied.len() != expected.len());
    for (i, &byte) in expected.iter().enumerate() {
        let other = supplied.get(i).copied().unwrap_or(!byte);
        diff |= other ^ byte;
    }
    std::hint::black_box(diff) == 0
}
