//! Rendering query results for people.

use std::{
    fmt::Write,
    time::{Duration, Instant},
};

use crate::{batch::StatusMap, roster::ServerDescriptor, samp::ServerInfo};

/// How long `/servers` reuses a previous batch when not configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Aggregate numbers over one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSummary {
    /// Players across all online servers.
    pub total_players: u32,
    /// Combined capacity of online servers.
    pub total_capacity: u32,
    /// Servers that answered.
    pub online: usize,
    /// Servers in the roster.
    pub servers: usize,
}

impl StatusSummary {
    /// Totals over the roster; servers missing from `results` count as offline.
    pub fn new(roster: &[ServerDescriptor], results: &StatusMap) -> Self {
        roster
            .iter()
            .filter_map(|server| results.get(&server.id))
            .filter(|info| info.is_online)
            .fold(
                Self {
                    servers: roster.len(),
                    ..Default::default()
                },
                |mut acc, info| {
                    acc.total_players += info.players as u32;
                    acc.total_capacity += info.max_players as u32;
                    acc.online += 1;
                    acc
                },
            )
    }
}

/// Renders one line per roster server followed by the totals.
pub fn format_servers_status(roster: &[ServerDescriptor], results: &StatusMap) -> String {
    let mut msg = String::from("🌐 **Arizona RP servers**\n\n");

    for server in roster {
        match results.get(&server.id) {
            Some(ServerInfo {
                is_online: true,
                players,
                max_players,
                ..
            }) => {
                writeln!(
                    msg,
                    "✅ {}. {} | Online: {players} / {max_players}",
                    server.id, server.name
                )
                .ok();
            }
            Some(ServerInfo { error, .. }) => {
                let reason = error.as_deref().unwrap_or("Server unavailable");
                writeln!(msg, "❌ {}. {} | {reason}", server.id, server.name).ok();
            }
            None => {
                writeln!(msg, "❌ {}. {} | No data", server.id, server.name).ok();
            }
        }
    }

    let summary = StatusSummary::new(roster, results);
    write!(
        msg,
        "\n📊 **Totals**\n🎮 Players online: **{}**\n⚡ Servers online: **{}/{}**",
        group_thousands(summary.total_players),
        summary.online,
        summary.servers
    )
    .ok();

    msg
}

/// `12345` -> `12,345`
pub fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Last batch of results and when it was taken.
#[derive(Debug, Default)]
pub struct StatusCache {
    /// Results of the last batch.
    pub results: StatusMap,
    /// When `results` was taken; `None` before the first batch.
    pub last_checked: Option<Instant>,
}

impl StatusCache {
    /// Cached results if younger than `ttl` at `now`.
    pub fn fresh(&self, now: Instant, ttl: Duration) -> Option<&StatusMap> {
        (!is_stale(self.last_checked, now, ttl)).then_some(&self.results)
    }

    /// Replaces the cached results.
    pub fn store(&mut self, results: StatusMap, now: Instant) {
        self.results = results;
        self.last_checked = Some(now);
    }
}

/// Whether results taken at `last_checked` are too old at `now`.
pub fn is_stale(last_checked: Option<Instant>, now: Instant, ttl: Duration) -> bool {
    match last_checked {
        Some(checked) => now.saturating_duration_since(checked) >= ttl,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::ARIZONA_SERVERS;

    fn online(players: u16, max_players: u16) -> ServerInfo {
        ServerInfo {
            is_online: true,
            players,
            max_players,
            ..Default::default()
        }
    }

    fn sample() -> StatusMap {
        let mut results = StatusMap::new();
        results.insert(1, online(950, 1000));
        results.insert(2, online(120, 1000));
        results.insert(3, ServerInfo::offline("Connection timeout"));
        results.insert(4, ServerInfo::default());
        results
    }

    #[test]
    fn lines_per_server() {
        let roster = &ARIZONA_SERVERS[..5];
        let text = format_servers_status(roster, &sample());

        assert!(text.contains("✅ 1. Phoenix | Online: 950 / 1000\n"));
        assert!(text.contains("✅ 2. Tucson | Online: 120 / 1000\n"));
        assert!(text.contains("❌ 3. Scottdale | Connection timeout\n"));
        assert!(text.contains("❌ 4. Chandler | Server unavailable\n"));
        assert!(text.contains("❌ 5. Brainburg | No data\n"));
        assert!(text.contains("Players online: **1,070**"));
        assert!(text.contains("Servers online: **2/5**"));
    }

    #[test]
    fn lines_follow_roster_order() {
        let text = format_servers_status(ARIZONA_SERVERS, &StatusMap::new());
        let positions = ARIZONA_SERVERS
            .iter()
            .map(|s| text.find(&format!(" {}. {} |", s.id, s.name)).unwrap())
            .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("Servers online: **0/31**"));
    }

    #[test]
    fn formatting_is_pure() {
        let results = sample();
        assert_eq!(
            format_servers_status(ARIZONA_SERVERS, &results),
            format_servers_status(ARIZONA_SERVERS, &results)
        );
    }

    #[test]
    fn summary_ignores_servers_outside_roster() {
        let mut results = sample();
        results.insert(200, online(10, 10));
        let summary = StatusSummary::new(&ARIZONA_SERVERS[..3], &results);
        assert_eq!(
            summary,
            StatusSummary {
                total_players: 1070,
                total_capacity: 2000,
                online: 2,
                servers: 3,
            }
        );
    }

    #[test]
    fn thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(31_000), "31,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn staleness() {
        let ttl = Duration::from_secs(300);
        let now = Instant::now();
        let later = now + Duration::from_secs(60);

        assert!(is_stale(None, now, ttl));
        assert!(!is_stale(Some(now), later, ttl));
        assert!(is_stale(Some(now), now + ttl, ttl));

        let mut cache = StatusCache::default();
        assert!(cache.fresh(now, ttl).is_none());
        cache.store(sample(), now);
        assert_eq!(cache.fresh(later, ttl).map(|r| r.len()), Some(4));
        assert!(cache.fresh(now + ttl * 2, ttl).is_none());
    }
}
