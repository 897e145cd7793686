//! Network infrastructure for the client.
//!
//! Frames travel to the server as single UDP datagrams with no reply, no
//! retry, and no ordering guarantee.  This module provides:
//!
//! - [`Endpoint`]: a `host[:port]` target, readable from `FT_DISPLAY`.
//! - [`FrameTransport`]: the seam between displays and the socket, mocked in
//!   unit tests.
//! - [`DisplayLink`]: the UDP implementation of [`FrameTransport`].
//! - [`NetworkDisplay`]: a [`FrameBuffer`](ft_core::FrameBuffer) bound to a
//!   transport, implementing [`Display`](ft_core::Display).

mod display;
mod endpoint;
mod link;

pub use display::{FrameMode, NetworkDisplay};
pub use endpoint::{Endpoint, EndpointError};
pub use link::DisplayLink;

use ft_core::TransmissionError;

/// Delivers encoded frames, one datagram per call.
///
/// Implementations must be [`Send`] so a streaming session can move its
/// transport onto a worker thread.
#[cfg_attr(test, mockall::automock)]
pub trait FrameTransport: Send {
    /// Sends `frame` as one datagram.
    ///
    /// # Errors
    ///
    /// Returns a [`TransmissionError`] if the frame is oversized, the
    /// transport is closed, or the OS send fails.  Nothing is retried.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmissionError>;

    /// Human-readable peer description for log lines.
    fn endpoint(&self) -> String;
}

impl<T: FrameTransport + ?Sized> FrameTransport for Box<T> {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), TransmissionError> {
        (**self).transmit(frame)
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}
