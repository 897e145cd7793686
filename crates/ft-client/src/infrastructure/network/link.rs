//! UDP datagram link to one display server.
//!
//! # Why a connected UDP socket? (for beginners)
//!
//! UDP has no connections on the wire, but calling `connect` on a UDP socket
//! fixes its default peer.  After that, `send` needs no address, the OS
//! filters out datagrams from other hosts, and some errors (such as an ICMP
//! "port unreachable" from a previous send) are reported back on the next
//! call.  A successful `connect` does **not** mean anything is listening.

use std::net::{SocketAddr, UdpSocket};

use ft_core::{DisplayError, TransmissionError, MAX_DATAGRAM_SIZE};
use tracing::{debug, info};

use super::endpoint::Endpoint;
use super::FrameTransport;

/// An open (or closed) datagram link to a display server.
#[derive(Debug)]
pub struct DisplayLink {
    endpoint: Endpoint,
    peer: SocketAddr,
    socket: Option<UdpSocket>,
}

impl DisplayLink {
    /// Resolves `endpoint`, binds an ephemeral local port, and connects the
    /// socket to the resolved peer.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Connection`] if resolution, bind, or connect
    /// fails.
    pub fn connect(endpoint: &Endpoint) -> Result<Self, DisplayError> {
        let connection_error = |source| DisplayError::Connection {
            endpoint: endpoint.to_string(),
            source,
        };

        let peer = endpoint.resolve().map_err(connection_error)?;
        let local: SocketAddr = if peer.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).map_err(connection_error)?;
        socket.connect(peer).map_err(connection_error)?;

        info!("display link open to {endpoint} ({peer})");
        Ok(Self {
            endpoint: endpoint.clone(),
            peer,
            socket: Some(socket),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Local address of the socket, or `None` once closed.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Sends `frame` as exactly one datagram.
    ///
    /// # Errors
    ///
    /// - [`TransmissionError::Oversize`] above [`MAX_DATAGRAM_SIZE`] bytes.
    /// - [`TransmissionError::Closed`] after [`DisplayLink::close`].
    /// - [`TransmissionError::Io`] if the OS rejects the send.
    /// - [`TransmissionError::ShortWrite`] if fewer bytes were sent.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmissionError> {
        if frame.len() > MAX_DATAGRAM_SIZE {
            return Err(TransmissionError::Oversize {
                size: frame.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        let socket = self.socket.as_ref().ok_or(TransmissionError::Closed)?;
        let sent = socket.send(frame)?;
        if sent != frame.len() {
            return Err(TransmissionError::ShortWrite {
                sent,
                expected: frame.len(),
            });
        }
        debug!(bytes = sent, peer = %self.peer, "datagram sent");
        Ok(())
    }

    /// Releases the socket.  Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            info!("display link to {} closed", self.endpoint);
        }
    }
}

impl FrameTransport for DisplayLink {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmissionError> {
        DisplayLink::transmit(self, frame)
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
