use std::io;

use thiserror::Error;

/// Reasons a single SAMP query can fail.
///
/// These are routine outcomes (servers go down, firewalls drop packets), so
/// they are folded into [`ServerInfo::error`](super::ServerInfo) at the query
/// boundary rather than propagated.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No datagram arrived before the client timeout.
    #[error("Connection timeout")]
    Timeout,

    /// The host could not be resolved to an IPv4 address.
    #[error("DNS error: {0}")]
    Dns(String),

    /// Socket bind/send/receive failure.
    #[error("Query error: {0}")]
    Io(#[from] io::Error),

    /// Reply is shorter than the echoed request header.
    #[error("Response too short")]
    TooShort,

    /// Reply ended inside a mandatory field.
    #[error("Invalid response format")]
    Malformed,
}
