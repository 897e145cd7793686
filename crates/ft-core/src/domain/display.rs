//! The [`Display`] seam and the error taxonomy shared by every display.
//!
//! Anything that owns pixels and can push them to a server implements
//! [`Display`]: a network-backed framebuffer, a remapped LED strip, or a whole
//! [`UnifiedCanvas`](crate::domain::canvas::UnifiedCanvas).  The composition
//! layer only ever talks to this trait, so it can be unit-tested with purely
//! in-memory displays.

use thiserror::Error;

use crate::domain::canvas::CanvasSendError;
use crate::domain::color::Color;
use crate::protocol::frame::FrameError;

/// Errors raised while building or sending a display.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Width or height was zero at construction time.
    #[error("invalid display dimensions {width}x{height}: both must be positive")]
    InvalidDimension { width: u32, height: u32 },

    /// The datagram transport could not be created for an endpoint.
    #[error("failed to open link to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// A frame could not be delivered to the transport.
    #[error("transmission failed: {0}")]
    Transmission(#[from] TransmissionError),

    /// One or more members of a composed display failed to send.
    #[error(transparent)]
    Composite(Box<CanvasSendError>),
}

/// Reasons a single frame transmission can fail.
///
/// These are recoverable: the framebuffer is untouched and can be resent.
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// The encoded frame does not fit in one datagram.
    #[error("frame of {size} bytes exceeds the {max}-byte datagram limit")]
    Oversize { size: usize, max: usize },

    /// The link was closed before the send.
    #[error("link is closed")]
    Closed,

    /// The OS accepted fewer bytes than the frame holds.
    #[error("short write: sent {sent} of {expected} bytes")]
    ShortWrite { sent: usize, expected: usize },

    /// The OS send call failed.
    #[error("send failed: {0}")]
    Io(#[from] std::io::Error),

    /// The frame could not be encoded.
    #[error("could not encode frame: {0}")]
    Encode(#[from] FrameError),
}

impl From<CanvasSendError> for DisplayError {
    fn from(err: CanvasSendError) -> Self {
        DisplayError::Composite(Box::new(err))
    }
}

/// A rectangular, addressable surface that can be pushed to a server.
///
/// Coordinates are signed so that callers can draw partially off-screen
/// shapes; every implementation silently drops writes outside
/// `[0, width) × [0, height)`.
pub trait Display {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Sets one pixel.  Out-of-bounds coordinates are a no-op.
    fn set(&mut self, x: i32, y: i32, color: Color);

    /// Reads one pixel back, or `None` when `(x, y)` is not addressable.
    fn get(&self, x: i32, y: i32) -> Option<Color>;

    /// Resets every pixel to the display's background value.
    fn clear(&mut self);

    /// Encodes the current pixels and transmits them.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::Transmission`] (or [`DisplayError::Composite`]
    /// for composed displays) when the frame could not be delivered.  Pixel
    /// state is never modified by a send, failed or not.
    fn send(&mut self) -> Result<(), DisplayError>;
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        (**self).set(x, y, color)
    }

    fn get(&self, x: i32, y: i32) -> Option<Color> {
        (**self).get(x, y)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn send(&mut self) -> Result<(), DisplayError> {
        (**self).send()
    }
}
