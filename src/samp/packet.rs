//! Wire format of the SAMP query protocol.
//!
//! Every request is an 11 byte header (server IPv4 octets, port, `SAMP`
//! magic, opcode) plus an opcode specific payload. Servers echo the header
//! back before the reply body, so parsers skip [`HEADER_LEN`] bytes.

use std::{
    io::{Cursor, Read},
    net::Ipv4Addr,
};

use byteorder::{LittleEndian, ReadBytesExt};

use super::QueryError;

/// Length of the header shared by requests and replies.
pub const HEADER_LEN: usize = 11;

/// Magic literal following the address in every packet.
pub const MAGIC: &[u8; 4] = b"SAMP";

/// Kind of information requested from a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Population, capacity, hostname, gamemode and language.
    ServerInfo = b'i',
    /// Player list with ids and pings.
    DetailedPlayers = b'd',
    /// Player list with scores.
    BasicPlayers = b'c',
    /// Server rules (`version`, `weburl`, ...).
    Rules = b'r',
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

/// Result of a server-info query.
///
/// Offline results always carry zero counts, empty strings and an `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Whether the server answered with a well formed reply.
    pub is_online: bool,
    /// Connected players.
    pub players: u16,
    /// Player capacity.
    pub max_players: u16,
    /// Server name, empty if the server did not send one.
    pub hostname: String,
    /// Gamemode name, empty if the server did not send one.
    pub gamemode: String,
    /// Language, empty if the server did not send one.
    pub language: String,
    /// Why the query failed.
    pub error: Option<String>,
}

impl ServerInfo {
    /// An offline result tagged with `error`.
    pub fn offline(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

impl From<QueryError> for ServerInfo {
    fn from(error: QueryError) -> Self {
        Self::offline(error.to_string())
    }
}

/// Rules reported by a server, in the order it sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRules(pub Vec<(String, String)>);

impl ServerRules {
    /// Value of the rule called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(rule, _)| rule == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Builds a query packet addressed to `ip:port`.
///
/// `extra` is appended verbatim; it is empty for every opcode this crate
/// sends.
pub fn build_query_packet(ip: Ipv4Addr, port: u16, opcode: Opcode, extra: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN + extra.len());
    packet.extend_from_slice(&ip.octets());
    packet.extend_from_slice(&port.to_le_bytes());
    packet.extend_from_slice(MAGIC);
    packet.push(opcode.into());
    packet.extend_from_slice(extra);
    packet
}

/// Decodes a server-info reply. Never fails: malformed input becomes an
/// offline [`ServerInfo`].
pub fn parse_server_info(data: &[u8]) -> ServerInfo {
    decode_server_info(data).unwrap_or_else(ServerInfo::from)
}

/// Decodes a rules reply.
pub fn parse_rules(data: &[u8]) -> Result<ServerRules, QueryError> {
    let mut rdr = body(data)?;
    let count = rdr.read_u16::<LittleEndian>().map_err(|_| QueryError::Malformed)?;

    let mut rules = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = read_short_string(&mut rdr)?;
        let value = read_short_string(&mut rdr)?;
        rules.push((name, value));
    }

    Ok(ServerRules(rules))
}

fn decode_server_info(data: &[u8]) -> Result<ServerInfo, QueryError> {
    let mut rdr = body(data)?;

    // password flag
    rdr.read_u8().map_err(|_| QueryError::Malformed)?;
    let players = rdr.read_u16::<LittleEndian>().map_err(|_| QueryError::Malformed)?;
    let max_players = rdr.read_u16::<LittleEndian>().map_err(|_| QueryError::Malformed)?;

    // Servers commonly truncate the descriptive tail, so it degrades to
    // empty strings instead of failing the whole reply.
    let hostname = read_trailing_string(&mut rdr);
    let gamemode = read_trailing_string(&mut rdr);
    let language = read_trailing_string(&mut rdr);

    Ok(ServerInfo {
        is_online: true,
        players,
        max_players,
        hostname,
        gamemode,
        language,
        error: None,
    })
}

/// Cursor positioned just past the echoed header.
fn body(data: &[u8]) -> Result<Cursor<&[u8]>, QueryError> {
    if data.len() < HEADER_LEN {
        return Err(QueryError::TooShort);
    }
    let mut rdr = Cursor::new(data);
    rdr.set_position(HEADER_LEN as u64);
    Ok(rdr)
}

fn remaining(rdr: &Cursor<&[u8]>) -> usize {
    rdr.get_ref().len().saturating_sub(rdr.position() as usize)
}

/// Reads a `u32` length prefixed string. A missing prefix yields an empty
/// string; a length overrunning the buffer yields an empty string and
/// consumes the rest of the buffer.
fn read_trailing_string(rdr: &mut Cursor<&[u8]>) -> String {
    let Ok(len) = rdr.read_u32::<LittleEndian>() else {
        return String::new();
    };
    let len = len as usize;
    if len > remaining(rdr) {
        rdr.set_position(rdr.get_ref().len() as u64);
        return String::new();
    }

    let start = rdr.position() as usize;
    rdr.set_position((start + len) as u64);
    String::from_utf8_lossy(&rdr.get_ref()[start..start + len]).into_owned()
}

/// Reads a `u8` length prefixed string.
fn read_short_string(rdr: &mut Cursor<&[u8]>) -> Result<String, QueryError> {
    let len = rdr.read_u8().map_err(|_| QueryError::Malformed)? as usize;
    let mut buf = vec![0; len];
    rdr.read_exact(&mut buf).map_err(|_| QueryError::Malformed)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
