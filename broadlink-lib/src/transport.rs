//! UDP request/response exchange with a device.
//!
//! Every exchange opens its own socket through a [`Connector`], sends one
//! frame (retrying send-level I/O errors up to [`SEND_RETRIES`] times), then
//! performs exactly one read under a deadline. Timeouts are never retried so
//! a request with side effects is not replayed.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, trace, warn};

use crate::constants::{MIN_RESPONSE_SIZE, RECV_BUFFER_SIZE, SEND_RETRIES};
use crate::error::BLError;
use crate::message::{Request, Response};
use crate::packet::{decrypt_response, encrypt_request};
use crate::session::Session;

/// A datagram socket owned by a single exchange.
#[async_trait]
pub trait Link: Send {
    async fn send_to(&mut self, frame: &[u8], dest: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram into `buf`, returning its length
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens a fresh [`Link`] per exchange.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, remote: SocketAddr) -> io::Result<Box<dyn Link>>;
}

/// Ephemeral tokio UDP sockets bound to the unspecified address.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpConnector;

#[async_trait]
impl Connector for UdpConnector {
    async fn open(&self, remote: SocketAddr) -> io::Result<Box<dyn Link>> {
        let local: SocketAddr = match remote {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        trace!(local = %socket.local_addr()?, "Opened UDP socket");
        Ok(Box::new(UdpLink { socket }))
    }
}

struct UdpLink {
    socket: UdpSocket,
}

#[async_trait]
impl Link for UdpLink {
    async fn send_to(&mut self, frame: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(frame, dest).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, peer) = self.socket.recv_from(buf).await?;
        trace!(%peer, len, "UDP datagram received");
        Ok(len)
    }
}

/// Send `frame`, retrying only send-level I/O errors.
///
/// Gives up after [`SEND_RETRIES`] attempts with [`BLError::SendFailed`]
/// carrying the last error.
pub async fn send_with_retries(
    link: &mut dyn Link,
    frame: &[u8],
    dest: SocketAddr,
) -> Result<usize, BLError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match link.send_to(frame, dest).await {
            Ok(sent) => return Ok(sent),
            Err(e) if attempt < SEND_RETRIES => {
                warn!(attempt, error = %e, %dest, "Send failed, retrying");
            }
            Err(e) => {
                return Err(BLError::SendFailed {
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Sends encrypted requests to one device and decrypts its replies.
#[derive(Clone)]
pub struct Transport {
    remote: SocketAddr,
    timeout: Duration,
    connector: Arc<dyn Connector>,
}

impl Transport {
    pub fn new(remote: SocketAddr, timeout: Duration, connector: Arc<dyn Connector>) -> Self {
        Self {
            remote,
            timeout,
            connector,
        }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One request/response round trip.
    ///
    /// The frame is built before any socket is opened, so an invalid payload
    /// sends nothing. The socket is dropped on every return path.
    pub async fn exchange(
        &self,
        session: &mut Session,
        request: &Request,
    ) -> Result<Response, BLError> {
        let frame = encrypt_request(session, request)?;

        let mut link = self.connector.open(self.remote).await?;

        debug!(bytes = hex::encode(&frame), count = session.count(), "UDP Write");
        send_with_retries(link.as_mut(), &frame, self.remote).await?;

        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let len = match tokio::time::timeout(self.timeout, link.recv(&mut buf)).await {
            Ok(result) => result.map_err(BLError::ReceiveFailed)?,
            Err(_) => {
                debug!(timeout = ?self.timeout, remote = %self.remote, "No reply before deadline");
                return Err(BLError::ResponseTimeout(self.timeout));
            }
        };
        let raw = &buf[..len];
        debug!(bytes = hex::encode(raw), "UDP Read");

        if len < MIN_RESPONSE_SIZE {
            return Err(BLError::MalformedResponse {
                expected: MIN_RESPONSE_SIZE,
                actual: len,
            });
        }

        decrypt_response(session, raw)
    }
}
