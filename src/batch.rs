//! Concurrent queries across a roster.

use std::{collections::BTreeMap, time::Duration};

use tokio::time::{self, Instant};
use tracing::{error, info, warn};

use crate::{
    roster::ServerDescriptor,
    samp::{QueryError, SampClient, ServerInfo},
};

/// Slack past the per-query timeout before a straggling task is abandoned.
pub const BATCH_GRACE: Duration = Duration::from_millis(500);

/// Results keyed by server id.
pub type StatusMap = BTreeMap<u8, ServerInfo>;

/// Queries every server in `roster` at once.
///
/// The returned map holds exactly one entry per roster id whatever the
/// individual outcomes, and the whole batch finishes within the client
/// timeout plus [`BATCH_GRACE`].
pub async fn query_all_servers(client: &SampClient, roster: &[ServerDescriptor]) -> StatusMap {
    let started = Instant::now();
    let deadline = started + client.timeout() + BATCH_GRACE;

    let handles = roster
        .iter()
        .map(|&server| {
            let client = *client;
            let handle =
                tokio::spawn(async move { client.query_server(server.host, server.port).await });
            (server.id, handle)
        })
        .collect::<Vec<_>>();

    let mut results = StatusMap::new();
    for (id, mut handle) in handles {
        let info = match time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(info)) => info,
            Ok(Err(error)) => {
                error!(id, %error, "server query task failed");
                ServerInfo::offline(error.to_string())
            }
            Err(_) => {
                handle.abort();
                warn!(id, "server query missed the batch deadline");
                ServerInfo::from(QueryError::Timeout)
            }
        };
        results.insert(id, info);
    }

    info!(
        servers = results.len(),
        online = results.values().filter(|info| info.is_online).count(),
        elapsed = %humantime::Duration::from(started.elapsed()),
        "queried roster"
    );
    results
}
