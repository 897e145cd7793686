//! A framebuffer bound to a transport.

use ft_core::{
    Color, Display, DisplayError, FrameBuffer, Offset, TransmissionError, MAX_DATAGRAM_SIZE,
};
use tracing::debug;

use super::endpoint::Endpoint;
use super::link::DisplayLink;
use super::FrameTransport;

/// How [`NetworkDisplay::send`](Display::send) encodes the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameMode {
    /// One plain frame addressed to the buffer's layer.
    #[default]
    Plain,
    /// Offset frames at the given placement, split into row bands that each
    /// fit in one datagram.
    Offset(Offset),
}

/// One display on a server: pixels plus the link that carries them.
#[derive(Debug)]
pub struct NetworkDisplay<T = DisplayLink> {
    buffer: FrameBuffer,
    transport: T,
    mode: FrameMode,
    max_datagram: usize,
}

impl NetworkDisplay<DisplayLink> {
    /// Opens a [`DisplayLink`] to `endpoint` and allocates a matching buffer.
    ///
    /// # Errors
    ///
    /// [`DisplayError::InvalidDimension`] for a zero dimension, or
    /// [`DisplayError::Connection`] if the link cannot be opened.
    pub fn connect(
        endpoint: &Endpoint,
        width: u32,
        height: u32,
        layer: u8,
        transparent: bool,
    ) -> Result<Self, DisplayError> {
        let buffer = FrameBuffer::new(width, height, layer, transparent)?;
        let link = DisplayLink::connect(endpoint)?;
        Ok(Self::new(buffer, link))
    }
}

impl<T: FrameTransport> NetworkDisplay<T> {
    pub fn new(buffer: FrameBuffer, transport: T) -> Self {
        Self {
            buffer,
            transport,
            mode: FrameMode::Plain,
            max_datagram: MAX_DATAGRAM_SIZE,
        }
    }

    pub fn with_mode(mut self, mode: FrameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Caps tile size in [`FrameMode::Offset`]; clamped to [`MAX_DATAGRAM_SIZE`].
    pub fn with_max_datagram(mut self, max_datagram: usize) -> Self {
        self.max_datagram = max_datagram.min(MAX_DATAGRAM_SIZE);
        self
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FrameMode) {
        self.mode = mode;
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.buffer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_parts(self) -> (FrameBuffer, T) {
        (self.buffer, self.transport)
    }

    fn transmit_all(&mut self) -> Result<(), TransmissionError> {
        match self.mode {
            FrameMode::Plain => self.transport.transmit(&self.buffer.encode()),
            FrameMode::Offset(offset) => {
                let tiles = self.buffer.encode_tiles(offset, self.max_datagram)?;
                debug!(tiles = tiles.len(), to = %self.transport.endpoint(), "sending tiled frame");
                for tile in &tiles {
                    self.transport.transmit(tile)?;
                }
                Ok(())
            }
        }
    }
}

impl<T: FrameTransport> Display for NetworkDisplay<T> {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        self.buffer.set(x, y, color)
    }

    fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.buffer.get(x, y)
    }

    fn clear(&mut self) {
        self.buffer.clear()
    }

    fn send(&mut self) -> Result<(), DisplayError> {
        self.transmit_all().map_err(DisplayError::from)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
