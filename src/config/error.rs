/// Startup configuration errors. Each one is fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid --{flag} value {value}: must be between 1 and 100")]
    InvalidThreshold { flag: &'static str, value: i64 },
    #[error("invalid --port value {0}: must be between 1 and 65535")]
    InvalidPort(i64),
    #[error("invalid --ratelimit value {0}: must be >= 0")]
    InvalidRateLimit(i64),
    #[error("invalid --bind address `{value}`: {source}")]
    InvalidBindAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid --allow CIDR: {0}")]
    InvalidNetwork(#[from] crate::security::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
