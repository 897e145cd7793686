//! RGB pixel values.
//!
//! The display server reserves pure black `(0, 0, 0)` to mean "show whatever is
//! on the layer below".  Opaque buffers therefore store [`Color::NEAR_BLACK`]
//! whenever a caller asks for black; see [`Color::for_buffer`].

/// A single 24-bit RGB pixel.  There is no alpha channel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Pure black.  Transparent on the server when the buffer is transparent.
    pub const BLACK: Color = Color::new(0, 0, 0);

    /// The darkest color that is still opaque on the server.
    pub const NEAR_BLACK: Color = Color::new(1, 1, 1);

    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    /// Creates a color from its three channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns `true` for `(0, 0, 0)`.
    pub const fn is_black(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Returns the value a buffer actually stores for `self`.
    ///
    /// Black passes through unchanged for transparent buffers and becomes
    /// [`Color::NEAR_BLACK`] for opaque ones.  Every other color is unchanged.
    pub const fn for_buffer(self, transparent: bool) -> Self {
        if self.is_black() && !transparent {
            Self::NEAR_BLACK
        } else {
            self
        }
    }

    /// The channel bytes in wire order.
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
