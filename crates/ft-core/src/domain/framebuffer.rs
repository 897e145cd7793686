//! In-memory RGB framebuffer for one logical display.
//!
//! A [`FrameBuffer`] is the client-side copy of what one display (or one layer
//! of one display) should show.  Callers draw into it with [`FrameBuffer::set`]
//! and serialize it with one of the `encode*` methods; the network layer ships
//! the resulting bytes.
//!
//! # Transparency
//!
//! The server treats pure black as "see-through".  A buffer created with
//! `transparent = false` therefore stores `(1, 1, 1)` whenever black is
//! written, so the pixel stays opaque.  A transparent buffer keeps black as
//! black, letting lower layers show.

use crate::domain::color::Color;
use crate::domain::display::DisplayError;
use crate::protocol::frame::{self, FrameError, Offset};

/// A mutable `width × height` RGB pixel grid with a target layer.
///
/// Invariant: `pixels.len() == width * height`; `(x, y)` lives at index
/// `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    layer: u8,
    transparent: bool,
    pixels: Vec<Color>,
}

impl FrameBuffer {
    /// Creates a buffer with every pixel set to `(0, 0, 0)`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::InvalidDimension`] if `width` or `height` is 0.
    pub fn new(width: u32, height: u32, layer: u8, transparent: bool) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            layer,
            transparent,
            pixels: vec![Color::BLACK; width as usize * height as usize],
        })
    }

    /// Builds a buffer from a row-major RGB byte dump, applying the
    /// transparency rule to every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::InvalidDimension`] for a zero dimension or when
    /// `rgb` is not exactly `width * height * 3` bytes long.
    pub fn from_rgb_bytes(
        width: u32,
        height: u32,
        layer: u8,
        transparent: bool,
        rgb: &[u8],
    ) -> Result<Self, DisplayError> {
        let mut buffer = Self::new(width, height, layer, transparent)?;
        if rgb.len() != buffer.pixels.len() * 3 {
            return Err(DisplayError::InvalidDimension { width, height });
        }
        for (dst, src) in buffer.pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *dst = Color::new(src[0], src[1], src[2]).for_buffer(transparent);
        }
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layer(&self) -> u8 {
        self.layer
    }

    pub fn transparent(&self) -> bool {
        self.transparent
    }

    /// Row-major pixel slice.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// Out-of-bounds coordinates are silently ignored.  Black is stored as
    /// [`Color::NEAR_BLACK`] unless the buffer is transparent.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index_of(x, y) {
            self.pixels[i] = color.for_buffer(self.transparent);
        }
    }

    /// Returns the stored pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index_of(x, y).map(|i| self.pixels[i])
    }

    /// Sets every pixel as if by [`FrameBuffer::set`].
    pub fn fill(&mut self, color: Color) {
        let stored = color.for_buffer(self.transparent);
        self.pixels.fill(stored);
    }

    /// Resets every pixel to the background: black when transparent,
    /// near-black when opaque.
    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    /// Encodes the buffer as a plain frame addressed to its layer.
    pub fn encode(&self) -> Vec<u8> {
        frame::plain_frame(self.width, self.height, self.layer, &self.pixels)
    }

    /// Encodes the buffer as a single offset frame.
    pub fn encode_with_offset(&self, offset: Offset) -> Vec<u8> {
        frame::offset_frame(self.width, self.height, offset, &self.pixels)
    }

    /// Encodes the buffer as one or more offset frames, each at most
    /// `max_datagram` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::RowTooWide`] if a single row does not fit.
    pub fn encode_tiles(&self, offset: Offset, max_datagram: usize) -> Result<Vec<Vec<u8>>, FrameError> {
        frame::encode_tiles(self.width, self.height, offset, &self.pixels, max_datagram)
    }

    /// Encodes the pixels as a PNG image.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Png`] if the encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, FrameError> {
        frame::encode_png(self.width, self.height, &self.pixels)
    }

    /// Encodes the buffer as a Q7 frame with a PNG payload.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Png`] if the encoder fails.
    pub fn encode_q7(&self, offset: Offset) -> Result<Vec<u8>, FrameError> {
        let png = self.encode_png()?;
        Ok(frame::encode_q7(self.width, self.height, offset, &png))
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
