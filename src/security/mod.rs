//! Request admission for the vitals endpoint.
//!
//! ```text
//! Incoming request:
//!     → allowlist   (403 if the peer is outside every network)
//!     → rate limit  (429, skipped for allowlisted peers)
//!     → API key     (401 on a missing or wrong X-API-Key)
//!     → vitals
//! ```
//!
//! All state is built once at startup from [`SecurityConfig`](crate::config::SecurityConfig);
//! only the rate limiter's counters change afterwards.

mod gate;
mod network;
mod rate_limit;

pub use gate::{AccessGate, Denial, constant_time_eq};
pub use network::{Error, IpNetwork, parse_allowlist};
pub use rate_limit::{RateLimiter, current_window};
