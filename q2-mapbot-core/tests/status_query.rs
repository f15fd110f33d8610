// Integration tests for the status client against throwaway UDP servers on loopback.

use std::time::Duration;

use q2_mapbot_core::error::StatusError;
use q2_mapbot_core::status::{StatusClient, PLAYER_COUNT_KEY, STATUS_REQUEST};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Binds a server that answers exactly one datagram with `reply` and returns the request it saw.
async fn serve_once(reply: &'static [u8]) -> (String, JoinHandle<Vec<u8>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = socket.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 64];
        let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
        socket.send_to(reply, peer).await.unwrap();
        buf[..len].to_vec()
    });
    (address, handle)
}

#[tokio::test]
async fn renders_single_player_server() {
    let (address, server) = serve_once(
        b"\xff\xff\xff\xffprint\n\\hostname\\MyServer\\mapname\\q2dm1\\maxclients\\8\n3 120 \"Alice\"\n\n",
    )
    .await;
    let client = StatusClient::new(Duration::from_secs(2));

    let report = client.report(&address).await;

    assert_eq!(report, "MyServer\nq2dm1 - 1/8\n[`Alice`]");
    assert_eq!(server.await.unwrap(), STATUS_REQUEST);
}

#[tokio::test]
async fn query_returns_structured_status() {
    let (address, _server) = serve_once(
        b"print\n\\HostName\\Arena\\mapname\\q2dm8\\maxclients\\16\\gamedir\\opentdm\n10 30 \"Alice\"\n-2 99 \"Bob Smith\"\n\n",
    )
    .await;
    let client = StatusClient::new(Duration::from_secs(2));

    let status = client.query(&address).await.unwrap();

    assert_eq!(status.player_count(), 2);
    assert_eq!(status.info.get("hostname"), Some("Arena"));
    assert_eq!(status.info.get("gamedir"), Some("opentdm"));
    assert_eq!(status.info.get(PLAYER_COUNT_KEY), Some("2"));
    assert_eq!(status.players[1].name, "Bob Smith");
    assert_eq!(status.players[1].score, -2);
}

#[tokio::test]
async fn refused_port_reports_connection_error() {
    let address = {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.local_addr().unwrap().to_string()
    };
    let client = StatusClient::new(Duration::from_secs(2));

    let report = client.report(&address).await;

    assert_eq!(report, format!("{address} - Connection error"));
}

#[tokio::test]
async fn silent_server_times_out() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = silent.local_addr().unwrap().to_string();
    let client = StatusClient::new(Duration::from_millis(150));

    let err = client.query(&address).await.unwrap_err();
    assert!(matches!(err, StatusError::Timeout { .. }), "{err:?}");

    assert_eq!(client.report(&address).await, format!("{address} - Read error"));
    drop(silent);
}

#[tokio::test]
async fn malformed_reply_is_not_rendered() {
    let (address, _server) = serve_once(b"print\n\\hostname\\x\\mapname\n").await;
    let client = StatusClient::new(Duration::from_secs(2));

    let report = client.report(&address).await;

    assert_eq!(report, format!("{address} - Invalid status reply"));
}

#[tokio::test]
async fn bad_address_is_a_connection_error() {
    let client = StatusClient::new(Duration::from_millis(200));
    assert_eq!(
        client.report("not an address").await,
        "not an address - Connection error"
    );
}
