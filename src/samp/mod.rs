//! Client side of the SAMP UDP query protocol.

mod client;
mod error;
pub mod packet;

pub use client::{SampClient, DEFAULT_TIMEOUT};
pub use error::QueryError;
pub use packet::{build_query_packet, parse_rules, parse_server_info, Opcode, ServerInfo, ServerRules};
