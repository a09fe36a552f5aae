use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use tokio::{net::UdpSocket, time};
use tracing::{debug, warn};

use super::{
    packet::{build_query_packet, parse_rules, parse_server_info, Opcode, ServerInfo, ServerRules},
    QueryError,
};

/// Largest reply we accept.
const RECV_BUF_LEN: usize = 4096;

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Sends one-shot SAMP queries over UDP.
///
/// Each query owns its socket, so a single client can be shared by any
/// number of concurrent queries.
#[derive(Debug, Clone, Copy)]
pub struct SampClient {
    timeout: Duration,
}

impl Default for SampClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SampClient {
    /// Client waiting at most `timeout` for each reply.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-query receive bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queries server info. Failures are reported through
    /// [`ServerInfo::error`], never returned.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn query_server(&self, host: &str, port: u16) -> ServerInfo {
        match self.request(host, port, Opcode::ServerInfo).await {
            Ok(reply) => {
                let info = parse_server_info(&reply);
                match info.error {
                    None => debug!(players = info.players, max = info.max_players, "server online"),
                    Some(ref error) => warn!(%error, "malformed server info reply"),
                }
                info
            }
            Err(error) => {
                debug!(%error, "server query failed");
                ServerInfo::from(error)
            }
        }
    }

    /// Queries the server's rule list.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn query_rules(&self, host: &str, port: u16) -> Result<ServerRules, QueryError> {
        let reply = self.request(host, port, Opcode::Rules).await?;
        parse_rules(&reply)
    }

    /// One request/response round trip. The socket is dropped on every
    /// return path.
    async fn request(&self, host: &str, port: u16, opcode: Opcode) -> Result<Vec<u8>, QueryError> {
        let ip = resolve(host, port, self.timeout).await?;
        let packet = build_query_packet(ip, port, opcode, &[]);

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.send_to(&packet, SocketAddrV4::new(ip, port)).await?;

        let mut buf = vec![0; RECV_BUF_LEN];
        let (len, _) = time::timeout(self.timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| QueryError::Timeout)??;
        buf.truncate(len);
        Ok(buf)
    }
}

/// Resolves `host` to the IPv4 address embedded in the packet header.
/// Lookups are bounded by the same timeout as the reply.
async fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Ipv4Addr, QueryError> {
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let mut addrs = time::timeout(timeout, tokio::net::lookup_host((host, port)))
        .await
        .map_err(|_| QueryError::Dns(format!("lookup of {host} timed out")))?
        .map_err(|error| QueryError::Dns(error.to_string()))?;

    addrs
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| QueryError::Dns(format!("no IPv4 address for {host}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_address_skips_lookup() {
        assert_eq!(
            resolve("176.57.147.190", 7777, DEFAULT_TIMEOUT).await.unwrap(),
            Ipv4Addr::new(176, 57, 147, 190)
        );
    }

    #[tokio::test]
    async fn unresolvable_host_is_dns_error() {
        let info = SampClient::default()
            .query_server("host.invalid", 7777)
            .await;
        assert!(!info.is_online);
        assert!(info.error.unwrap().starts_with("DNS error: "));
    }
}
