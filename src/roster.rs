//! The Arizona RP servers this bot reports on.

/// Default SAMP port.
pub const DEFAULT_PORT: u16 = 7777;

/// A game server to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerDescriptor {
    /// Arizona RP server number.
    pub id: u8,
    /// Display name.
    pub name: &'static str,
    /// IPv4 address.
    pub host: &'static str,
    /// UDP query port.
    pub port: u16,
}

const fn server(id: u8, name: &'static str, host: &'static str) -> ServerDescriptor {
    ServerDescriptor {
        id,
        name,
        host,
        port: DEFAULT_PORT,
    }
}

/// Every Arizona RP server, in id order.
pub const ARIZONA_SERVERS: &[ServerDescriptor] = &[
    server(1, "Phoenix", "176.57.147.190"),
    server(2, "Tucson", "176.57.147.191"),
    server(3, "Scottdale", "176.57.147.192"),
    server(4, "Chandler", "176.57.147.193"),
    server(5, "Brainburg", "176.57.147.194"),
    server(6, "Saint-Rose", "176.57.147.195"),
    server(7, "Mesa", "176.57.147.196"),
    server(8, "Red-Rock", "176.57.147.197"),
    server(9, "Yuma", "176.57.147.198"),
    server(10, "Surprise", "176.57.147.199"),
    server(11, "Prescott", "176.57.147.200"),
    server(12, "Glendale", "176.57.147.201"),
    server(13, "Kingman", "176.57.147.202"),
    server(14, "Winslow", "176.57.147.203"),
    server(15, "Payson", "176.57.147.204"),
    server(16, "Gilbert", "176.57.147.205"),
    server(17, "Show Low", "176.57.147.206"),
    server(18, "Casa-Grande", "176.57.147.207"),
    server(19, "Page", "176.57.147.208"),
    server(20, "Sun-City", "176.57.147.209"),
    server(21, "Queen-Creek", "176.57.147.210"),
    server(22, "Sedona", "176.57.147.211"),
    server(23, "Holiday", "176.57.147.212"),
    server(24, "Wednesday", "176.57.147.213"),
    server(25, "Yava", "176.57.147.214"),
    server(26, "Faraway", "176.57.147.215"),
    server(27, "Bumble Bee", "176.57.147.216"),
    server(28, "Christmas", "176.57.147.217"),
    server(29, "Mirage", "176.57.147.218"),
    server(30, "Love", "176.57.147.219"),
    server(31, "Drake", "176.57.147.220"),
];

/// Looks up a roster entry by id.
pub fn find(roster: &[ServerDescriptor], id: u8) -> Option<&ServerDescriptor> {
    roster.iter().find(|server| server.id == id)
}
