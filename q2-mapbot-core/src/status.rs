//! Connectionless `status` query against a Quake 2 server.
//!
//! One request datagram, one reply datagram, no retries. The only cancellation is the
//! read deadline.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, error, info};

use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::format::format_status;
use crate::infostring::{self, InfoMap, PlayerRecord};

/// Out-of-band marker followed by the newline-terminated `status` command.
pub const STATUS_REQUEST: &[u8] = b"\xff\xff\xff\xffstatus\n";

/// Reserved info key holding the number of player lines in the reply.
pub const PLAYER_COUNT_KEY: &str = "player_count";

const REPLY_BUFFER_LEN: usize = 1500;

/// Parsed reply of one query. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub info: InfoMap,
    pub players: Vec<PlayerRecord>,
}

impl ServerStatus {
    pub fn new(mut info: InfoMap, players: Vec<PlayerRecord>) -> Self {
        info.insert(PLAYER_COUNT_KEY, players.len().to_string());
        Self { info, players }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

#[derive(Debug, Clone)]
pub struct StatusClient {
    timeout: Duration,
}

impl StatusClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(config.timeout())
    }

    /// Sends a status request to `address` (`host:port`) and decodes the single reply.
    pub async fn query(&self, address: &str) -> Result<ServerStatus, StatusError> {
        let peer = resolve_ipv4(address).await?;

        // Connecting the socket makes a refused port surface as an error on recv.
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| StatusError::connect(address, e))?;
        socket
            .connect(peer)
            .await
            .map_err(|e| StatusError::connect(address, e))?;
        socket
            .send(STATUS_REQUEST)
            .await
            .map_err(|e| StatusError::connect(address, e))?;
        debug!(address, peer = %peer, "Sent status request");

        let mut buf = [0u8; REPLY_BUFFER_LEN];
        let len = match tokio::time::timeout(self.timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(StatusError::connect(address, e));
            }
            Ok(Err(source)) => {
                return Err(StatusError::Receive {
                    address: address.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(StatusError::Timeout {
                    address: address.to_string(),
                    timeout: self.timeout,
                });
            }
        };
        debug!(address, bytes = len, "Received status reply");

        let reply = infostring::decode(&buf[..len]).map_err(|source| StatusError::Malformed {
            address: address.to_string(),
            source,
        })?;
        Ok(ServerStatus::new(reply.info, reply.players))
    }

    /// Queries `address` and renders the outcome as a chat reply. Never fails.
    pub async fn report(&self, address: &str) -> String {
        match self.query(address).await {
            Ok(status) => {
                info!(address, players = status.player_count(), "Status query succeeded");
                format_status(&status)
            }
            Err(e @ StatusError::Connect { .. }) => {
                error!(address, error = %e, "Status query connection error");
                format!("{address} - Connection error")
            }
            Err(e @ (StatusError::Timeout { .. } | StatusError::Receive { .. })) => {
                error!(address, error = %e, "Status query read error");
                format!("{address} - Read error")
            }
            Err(e @ StatusError::Malformed { .. }) => {
                error!(address, error = %e, "Status reply could not be decoded");
                format!("{address} - Invalid status reply")
            }
        }
    }
}

async fn resolve_ipv4(address: &str) -> Result<SocketAddr, StatusError> {
    let mut addrs = tokio::net::lookup_host(address)
        .await
        .map_err(|e| StatusError::connect(address, e))?;
    addrs.find(SocketAddr::is_ipv4).ok_or_else(|| {
        StatusError::connect(
            address,
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no IPv4 address"),
        )
    })
}
