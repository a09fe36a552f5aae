use std::time::{Duration, Instant};

use arizona_status_bot::{
    batch::query_all_servers,
    roster::ServerDescriptor,
    samp::{packet::HEADER_LEN, QueryError, SampClient},
    status::format_servers_status,
};
use tokio::net::UdpSocket;

const TIMEOUT: Duration = Duration::from_millis(300);

fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Answers every `'i'` query with the given population and every `'r'`
/// query with a version rule.
async fn mock_server(players: u16, max_players: u16, hostname: &'static str) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut buf = [0; 512];
        loop {
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, HEADER_LEN);
            assert_eq!(&buf[..4], &[127, 0, 0, 1]);
            assert_eq!(&buf[4..6], &port.to_le_bytes());
            assert_eq!(&buf[6..10], b"SAMP");

            let mut reply = buf[..HEADER_LEN].to_vec();
            match buf[10] {
                b'i' => {
                    reply.push(0);
                    reply.extend_from_slice(&players.to_le_bytes());
                    reply.extend_from_slice(&max_players.to_le_bytes());
                    push_string(&mut reply, hostname);
                    push_string(&mut reply, "Arizona Role Play");
                    push_string(&mut reply, "Russian");
                }
                b'r' => {
                    reply.extend_from_slice(&1_u16.to_le_bytes());
                    reply.push(7);
                    reply.extend_from_slice(b"version");
                    reply.push(8);
                    reply.extend_from_slice(b"0.3.7-R2");
                }
                other => panic!("unexpected opcode {other}"),
            }
            socket.send_to(&reply, peer).await.unwrap();
        }
    });

    port
}

/// Receives queries and never answers.
async fn silent_server() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0; 512];
        while socket.recv_from(&mut buf).await.is_ok() {}
    });
    port
}

/// Answers with a reply that stops inside the player counts.
async fn garbage_server() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0; 512];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            let mut reply = buf[..len].to_vec();
            reply.extend_from_slice(&[0, 1]);
            let _ = socket.send_to(&reply, peer).await;
        }
    });
    port
}

fn local(id: u8, name: &'static str, port: u16) -> ServerDescriptor {
    ServerDescriptor {
        id,
        name,
        host: "127.0.0.1",
        port,
    }
}

#[tokio::test]
async fn query_online_server() {
    let port = mock_server(42, 100, "Test Server").await;
    let client = SampClient::new(TIMEOUT);

    let info = client.query_server("127.0.0.1", port).await;
    assert!(info.is_online);
    assert_eq!(info.players, 42);
    assert_eq!(info.max_players, 100);
    assert_eq!(info.hostname, "Test Server");
    assert_eq!(info.gamemode, "Arizona Role Play");
    assert_eq!(info.language, "Russian");
    assert_eq!(info.error, None);

    let rules = client.query_rules("127.0.0.1", port).await.unwrap();
    assert_eq!(rules.get("version"), Some("0.3.7-R2"));
}

#[tokio::test]
async fn query_timeout() {
    let port = silent_server().await;
    let client = SampClient::new(TIMEOUT);

    let info = client.query_server("127.0.0.1", port).await;
    assert!(!info.is_online);
    assert_eq!((info.players, info.max_players), (0, 0));
    assert_eq!(info.error.as_deref(), Some("Connection timeout"));

    assert!(matches!(
        client.query_rules("127.0.0.1", port).await,
        Err(QueryError::Timeout)
    ));
}

#[tokio::test]
async fn query_malformed_reply() {
    let port = garbage_server().await;
    let info = SampClient::new(TIMEOUT).query_server("127.0.0.1", port).await;
    assert!(!info.is_online);
    assert_eq!(info.error.as_deref(), Some("Invalid response format"));
}

#[tokio::test]
async fn batch_isolates_failures() {
    let roster = [
        local(1, "Phoenix", mock_server(950, 1000, "Phoenix").await),
        local(2, "Tucson", silent_server().await),
        local(3, "Scottdale", mock_server(10, 1000, "Scottdale").await),
        local(4, "Chandler", garbage_server().await),
    ];

    let results = query_all_servers(&SampClient::new(TIMEOUT), &roster).await;
    assert_eq!(results.keys().copied().collect::<Vec<_>>(), [1, 2, 3, 4]);

    assert!(results[&1].is_online);
    assert_eq!(results[&1].players, 950);
    assert_eq!(results[&2].error.as_deref(), Some("Connection timeout"));
    assert!(results[&3].is_online);
    assert_eq!(results[&3].players, 10);
    assert!(!results[&4].is_online);

    let text = format_servers_status(&roster, &results);
    assert!(text.contains("✅ 1. Phoenix | Online: 950 / 1000"));
    assert!(text.contains("❌ 2. Tucson | Connection timeout"));
    assert!(text.contains("Players online: **960**"));
    assert!(text.contains("Servers online: **2/4**"));
}

#[tokio::test]
async fn batch_runs_concurrently() {
    let mut roster = Vec::new();
    for id in 1..=6 {
        roster.push(local(id, "Silent", silent_server().await));
    }

    let started = Instant::now();
    let results = query_all_servers(&SampClient::new(TIMEOUT), &roster).await;
    let elapsed = started.elapsed();

    assert_eq!(results.len(), roster.len());
    assert!(results.values().all(|info| !info.is_online));
    assert!(
        elapsed < TIMEOUT * 3,
        "batch took {elapsed:?}, expected about one timeout"
    );
}

#[tokio::test]
async fn batch_covers_every_server_when_all_fail() {
    let roster = [
        local(7, "Mesa", silent_server().await),
        ServerDescriptor {
            id: 8,
            name: "Red-Rock",
            host: "red-rock.invalid",
            port: 7777,
        },
    ];

    let results = query_all_servers(&SampClient::new(TIMEOUT), &roster).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[&7].error.as_deref(), Some("Connection timeout"));
    assert!(results[&8].error.as_deref().unwrap().starts_with("DNS error: "));
}
