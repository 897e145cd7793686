//! Wire codec for Flaschen Taschen frames.
//!
//! Three frame variants travel over UDP, one datagram each:
//!
//! ```text
//! Plain   P6\n<w> <h>\n255\n<rgb bytes>0\n0\n<layer>\n
//! Offset  P6\n<w> <h>\n#FT: <x> <y> <z>\n255\n<rgb bytes>
//! Q7      Q7\n<w> <h>\n255\n<x>\n <y>\n <z>\n<png bytes>
//! ```
//!
//! The plain variant is a valid netpbm P6 image with a trailing footer that
//! ordinary image readers ignore.  The offset variant carries its placement
//! in a header comment instead.  Q7 replaces the raw dump with a PNG payload
//! for content that would not fit a datagram uncompressed.
//!
//! All integers are ASCII decimal.  Pixel data is row-major RGB, origin
//! top-left.

use std::fmt::Write as _;

use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, ImageFormat};
use thiserror::Error;

use crate::domain::color::Color;

/// Largest UDP payload that fits in one IPv4 datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Bytes set aside for the textual header when tiling a frame.
pub const HEADER_RESERVE: usize = 64;

/// Port the display server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 1337;

/// Maximum channel value announced in every header.
const MAX_CHANNEL_VALUE: u16 = 255;

/// Errors produced while encoding or parsing a frame.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// Not even a single row fits in the datagram budget.
    #[error("a {row_bytes}-byte row does not fit a {max_datagram}-byte datagram")]
    RowTooWide { row_bytes: usize, max_datagram: usize },

    /// The pixel slice length does not match the declared geometry.
    #[error("{actual} pixels supplied for a {width}x{height} frame")]
    PixelCount {
        width: u32,
        height: u32,
        actual: usize,
    },

    /// The PNG encoder or decoder rejected the image.
    #[error("png codec error: {0}")]
    Png(String),

    /// The header could not be parsed.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The header parsed but the payload is shorter than it declares.
    #[error("truncated frame: need {needed} bytes of pixel data, got {available}")]
    Truncated { needed: usize, available: usize },
}

/// A 3-D placement on the server: `x`/`y` in pixels, `z` is the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl Offset {
    pub const fn new(x: i32, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// Which wire variant a parsed frame arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// P6 without placement information.
    Plain,
    /// P6 with a `#FT:` comment and/or a trailing footer.
    Offset,
    /// Q7 header with a PNG payload.
    Q7,
}

/// A frame decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    pub kind: FrameKind,
    pub width: u32,
    pub height: u32,
    /// Placement; all zero when the frame carried none.
    pub offset: Offset,
    /// Row-major pixels, `width * height` entries.
    pub pixels: Vec<Color>,
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes a plain frame: P6 header, pixel dump, `0\n0\n<layer>\n` footer.
///
/// # Errors
///
/// Returns [`FrameError::PixelCount`] if `pixels` does not hold
/// `width * height` entries.
pub fn encode_plain(
    width: u32,
    height: u32,
    layer: u8,
    pixels: &[Color],
) -> Result<Vec<u8>, FrameError> {
    check_pixel_count(width, height, pixels)?;
    Ok(plain_frame(width, height, layer, pixels))
}

/// Encodes an offset frame with the placement in a `#FT:` header comment.
///
/// # Errors
///
/// Returns [`FrameError::PixelCount`] on a geometry mismatch.
pub fn encode_offset(
    width: u32,
    height: u32,
    offset: Offset,
    pixels: &[Color],
) -> Result<Vec<u8>, FrameError> {
    check_pixel_count(width, height, pixels)?;
    Ok(offset_frame(width, height, offset, pixels))
}

/// Splits a frame into horizontal bands that each fit in `max_datagram` bytes.
///
/// Every band is a complete offset frame.  Band `n` starts at row `r` of the
/// source and carries `offset.y + r` as its `y`, so the server reassembles
/// the bands in place.  A frame that already fits comes back as a single
/// band.
///
/// # Errors
///
/// Returns [`FrameError::RowTooWide`] if one row plus [`HEADER_RESERVE`]
/// exceeds `max_datagram`, and [`FrameError::PixelCount`] on a geometry
/// mismatch.
pub fn encode_tiles(
    width: u32,
    height: u32,
    offset: Offset,
    pixels: &[Color],
    max_datagram: usize,
) -> Result<Vec<Vec<u8>>, FrameError> {
    check_pixel_count(width, height, pixels)?;

    let row_bytes = width as usize * 3;
    if row_bytes == 0 || pixels.is_empty() {
        return Ok(vec![offset_frame(width, height, offset, pixels)]);
    }
    let rows_per_tile = max_datagram.saturating_sub(HEADER_RESERVE) / row_bytes;
    if rows_per_tile == 0 {
        return Err(FrameError::RowTooWide {
            row_bytes,
            max_datagram,
        });
    }

    let row_len = width as usize;
    let tiles = pixels
        .chunks(rows_per_tile * row_len)
        .enumerate()
        .map(|(i, band)| {
            let band_rows = (band.len() / row_len) as u32;
            let band_offset = Offset {
                y: offset.y + (i * rows_per_tile) as i32,
                ..offset
            };
            offset_frame(width, band_rows, band_offset, band)
        })
        .collect();
    Ok(tiles)
}

/// Encodes `pixels` as an 8-bit RGB PNG.
///
/// # Errors
///
/// Returns [`FrameError::Png`] if the encoder fails and
/// [`FrameError::PixelCount`] on a geometry mismatch.
pub fn encode_png(width: u32, height: u32, pixels: &[Color]) -> Result<Vec<u8>, FrameError> {
    check_pixel_count(width, height, pixels)?;
    let mut raw = Vec::with_capacity(pixels.len() * 3);
    push_pixels(&mut raw, pixels);

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&raw, width, height, ColorType::Rgb8)
        .map_err(|e| FrameError::Png(e.to_string()))?;
    Ok(png)
}

/// Wraps an already encoded PNG in a Q7 header.
pub fn encode_q7(width: u32, height: u32, offset: Offset, png: &[u8]) -> Vec<u8> {
    let header = format!(
        "Q7\n{width} {height}\n{MAX_CHANNEL_VALUE}\n{}\n {}\n {}\n",
        offset.x, offset.y, offset.z
    );
    let mut buf = Vec::with_capacity(header.len() + png.len());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(png);
    buf
}

pub(crate) fn plain_frame(width: u32, height: u32, layer: u8, pixels: &[Color]) -> Vec<u8> {
    let header = format!("P6\n{width} {height}\n{MAX_CHANNEL_VALUE}\n");
    let footer = format!("0\n0\n{layer}\n");

    let mut buf = Vec::with_capacity(header.len() + pixels.len() * 3 + footer.len());
    buf.extend_from_slice(header.as_bytes());
    push_pixels(&mut buf, pixels);
    buf.extend_from_slice(footer.as_bytes());
    buf
}

pub(crate) fn offset_frame(width: u32, height: u32, offset: Offset, pixels: &[Color]) -> Vec<u8> {
    let mut header = String::with_capacity(HEADER_RESERVE);
    // Writing into a String cannot fail.
    let _ = write!(
        header,
        "P6\n{width} {height}\n#FT: {} {} {}\n{MAX_CHANNEL_VALUE}\n",
        offset.x, offset.y, offset.z
    );
    let mut buf = Vec::with_capacity(header.len() + pixels.len() * 3);
    buf.extend_from_slice(header.as_bytes());
    push_pixels(&mut buf, pixels);
    buf
}

fn push_pixels(buf: &mut Vec<u8>, pixels: &[Color]) {
    for c in pixels {
        buf.extend_from_slice(&c.to_bytes());
    }
}

fn check_pixel_count(width: u32, height: u32, pixels: &[Color]) -> Result<(), FrameError> {
    if pixels.len() != width as usize * height as usize {
        return Err(FrameError::PixelCount {
            width,
            height,
            actual: pixels.len(),
        });
    }
    Ok(())
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parses one datagram in any of the three wire variants.
///
/// P6 placement is taken from a `#FT:` header comment if present; a trailing
/// footer after the pixel data overrides it, field by field, the way the
/// server reads frames.
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] for an unknown magic or unreadable
/// header, [`FrameError::Truncated`] when pixel data is missing, and
/// [`FrameError::Png`] when a Q7 payload does not decode.
pub fn parse_frame(bytes: &[u8]) -> Result<ParsedFrame, FrameError> {
    match bytes.get(..2) {
        Some(b"P6") => parse_p6(bytes),
        Some(b"Q7") => parse_q7(bytes),
        _ => Err(FrameError::Malformed("unknown magic".into())),
    }
}

fn parse_p6(bytes: &[u8]) -> Result<ParsedFrame, FrameError> {
    let mut cursor = HeaderCursor::new(bytes, 2);
    let width = cursor.dimension("width")?;
    let height = cursor.dimension("height")?;
    cursor.channel_range()?;
    cursor.single_separator()?;

    let mut offset = cursor.comment_offset.unwrap_or_default();
    let mut kind = if cursor.comment_offset.is_some() {
        FrameKind::Offset
    } else {
        FrameKind::Plain
    };

    let data = &bytes[cursor.pos..];
    let needed = pixel_bytes(width, height)?;
    if data.len() < needed {
        return Err(FrameError::Truncated {
            needed,
            available: data.len(),
        });
    }

    let footer = &data[needed..];
    let mut footer_cursor = HeaderCursor::new(footer, 0);
    let footer_fields = [
        footer_cursor.number(),
        footer_cursor.number(),
        footer_cursor.number(),
    ];
    if let Some(x) = footer_fields[0] {
        offset.x = x as i32;
        if let Some(y) = footer_fields[1] {
            offset.y = y as i32;
            if let Some(z) = footer_fields[2] {
                offset.z = layer_from(z)?;
            }
        }
        if offset != Offset::default() {
            kind = FrameKind::Offset;
        }
    }

    let pixels = data[..needed]
        .chunks_exact(3)
        .map(|c| Color::new(c[0], c[1], c[2]))
        .collect();

    Ok(ParsedFrame {
        kind,
        width,
        height,
        offset,
        pixels,
    })
}

fn parse_q7(bytes: &[u8]) -> Result<ParsedFrame, FrameError> {
    let mut cursor = HeaderCursor::new(bytes, 2);
    let width = cursor.dimension("width")?;
    let height = cursor.dimension("height")?;
    cursor.channel_range()?;
    let x = cursor.required("x offset")?;
    let y = cursor.required("y offset")?;
    let z = cursor.required("layer")?;
    cursor.single_separator()?;

    let png = &bytes[cursor.pos..];
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| FrameError::Png(e.to_string()))?
        .to_rgb8();
    if decoded.dimensions() != (width, height) {
        let (png_width, png_height) = decoded.dimensions();
        return Err(FrameError::Malformed(format!(
            "header declares {width}x{height} but png is {png_width}x{png_height}"
        )));
    }
    let pixels = decoded
        .into_raw()
        .chunks_exact(3)
        .map(|c| Color::new(c[0], c[1], c[2]))
        .collect();

    Ok(ParsedFrame {
        kind: FrameKind::Q7,
        width,
        height,
        offset: Offset::new(x as i32, y as i32, layer_from(z)?),
        pixels,
    })
}

/// Size of the RGB dump for a `width × height` frame.
fn pixel_bytes(width: u32, height: u32) -> Result<usize, FrameError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| FrameError::Malformed(format!("dimensions {width}x{height} too large")))
}

fn layer_from(value: i64) -> Result<u8, FrameError> {
    u8::try_from(value).map_err(|_| FrameError::Malformed(format!("layer {value} out of range")))
}

/// Reads whitespace-separated decimal fields, skipping `#` comments and
/// remembering the first `#FT:` placement it sees.
struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    comment_offset: Option<Offset>,
}

impl<'a> HeaderCursor<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self {
            bytes,
            pos,
            comment_offset: None,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.bytes.get(self.pos) != Some(&b'#') {
                return;
            }
            let start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                self.pos += 1;
            }
            self.read_special_comment(start, self.pos);
        }
    }

    fn read_special_comment(&mut self, start: usize, end: usize) {
        let line = &self.bytes[start..end];
        let Some(rest) = line.strip_prefix(b"#FT:") else {
            return;
        };
        let mut inner = HeaderCursor::new(rest, 0);
        let mut offset = Offset::default();
        if let Some(x) = inner.number() {
            offset.x = x as i32;
            if let Some(y) = inner.number() {
                offset.y = y as i32;
                if let Some(z) = inner.number().and_then(|z| u8::try_from(z).ok()) {
                    offset.z = z;
                }
            }
        }
        self.comment_offset.get_or_insert(offset);
    }

    /// Reads the next optionally signed decimal, or `None` without consuming
    /// anything but whitespace and comments.
    fn number(&mut self) -> Option<i64> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        let mut end = start;
        if matches!(self.bytes.get(end), Some(b'-') | Some(b'+')) {
            end += 1;
        }
        let digits_start = end;
        while end < self.bytes.len() && self.bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        let text = std::str::from_utf8(&self.bytes[start..end]).ok()?;
        let value = text.parse().ok()?;
        self.pos = end;
        Some(value)
    }

    fn required(&mut self, field: &str) -> Result<i64, FrameError> {
        self.number()
            .ok_or_else(|| FrameError::Malformed(format!("missing {field}")))
    }

    fn dimension(&mut self, field: &str) -> Result<u32, FrameError> {
        let value = self.required(field)?;
        u32::try_from(value)
            .map_err(|_| FrameError::Malformed(format!("{field} {value} out of range")))
    }

    fn channel_range(&mut self) -> Result<(), FrameError> {
        match self.required("channel range")? {
            255 => Ok(()),
            other => Err(FrameError::Malformed(format!(
                "unsupported channel range {other}"
            ))),
        }
    }

    /// Consumes exactly one whitespace byte separating the header from data.
    fn single_separator(&mut self) -> Result<(), FrameError> {
        match self.bytes.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(FrameError::Malformed("missing separator before data".into())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, c: Color) -> Vec<Color> {
        vec![c; (width * height) as usize]
    }

    // ── encode_plain ─────────────────────────────────────────────────────────

    #[test]
    fn test_encode_plain_writes_header_pixels_and_footer() {
        // Arrange
        let pixels = vec![Color::new(1, 2, 3), Color::new(4, 5, 6)];

        // Act
        let bytes = encode_plain(2, 1, 7, &pixels).unwrap();

        // Assert
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        expected.extend_from_slice(b"0\n0\n7\n");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_plain_rejects_wrong_pixel_count() {
        let result = encode_plain(2, 2, 0, &[Color::BLACK]);
        assert_eq!(
            result,
            Err(FrameError::PixelCount {
                width: 2,
                height: 2,
                actual: 1
            })
        );
    }

    // ── encode_offset ────────────────────────────────────────────────────────

    #[test]
    fn test_encode_offset_embeds_placement_in_header_comment() {
        let bytes = encode_offset(1, 1, Offset::new(10, -3, 2), &[Color::RED]).unwrap();
        assert_eq!(bytes, b"P6\n1 1\n#FT: 10 -3 2\n255\n\xff\x00\x00".to_vec());
    }

    // ── encode_tiles ─────────────────────────────────────────────────────────

    #[test]
    fn test_encode_tiles_returns_single_tile_when_frame_fits() {
        let pixels = solid(4, 4, Color::GREEN);
        let tiles = encode_tiles(4, 4, Offset::default(), &pixels, MAX_DATAGRAM_SIZE).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0], encode_offset(4, 4, Offset::default(), &pixels).unwrap());
    }

    #[test]
    fn test_encode_tiles_splits_on_row_boundaries_and_advances_y() {
        // Arrange: 10 px wide rows are 30 bytes; budget allows two rows per tile.
        let pixels = solid(10, 5, Color::BLUE);
        let budget = HEADER_RESERVE + 2 * 30;

        // Act
        let tiles = encode_tiles(10, 5, Offset::new(3, 100, 1), &pixels, budget).unwrap();

        // Assert: rows 0-1, 2-3, 4
        assert_eq!(tiles.len(), 3);
        let parsed: Vec<_> = tiles.iter().map(|t| parse_frame(t).unwrap()).collect();
        assert_eq!(parsed[0].height, 2);
        assert_eq!(parsed[0].offset, Offset::new(3, 100, 1));
        assert_eq!(parsed[1].offset, Offset::new(3, 102, 1));
        assert_eq!(parsed[2].height, 1);
        assert_eq!(parsed[2].offset, Offset::new(3, 104, 1));
        assert!(tiles.iter().all(|t| t.len() <= budget));
    }

    #[test]
    fn test_encode_tiles_rejects_row_wider_than_budget() {
        let pixels = solid(100, 1, Color::WHITE);
        let result = encode_tiles(100, 1, Offset::default(), &pixels, 200);
        assert_eq!(
            result,
            Err(FrameError::RowTooWide {
                row_bytes: 300,
                max_datagram: 200
            })
        );
    }

    // ── Q7 ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_encode_q7_header_layout() {
        let bytes = encode_q7(256, 96, Offset::new(1, 2, 5), b"PNGDATA");
        assert_eq!(bytes, b"Q7\n256 96\n255\n1\n 2\n 5\nPNGDATA".to_vec());
    }

    #[test]
    fn test_q7_frame_with_png_payload_parses_back_to_pixels() {
        // Arrange
        let pixels = vec![Color::RED, Color::GREEN, Color::BLUE, Color::BLACK];
        let png = encode_png(2, 2, &pixels).unwrap();

        // Act
        let parsed = parse_frame(&encode_q7(2, 2, Offset::new(4, 5, 6), &png)).unwrap();

        // Assert
        assert_eq!(parsed.kind, FrameKind::Q7);
        assert_eq!(parsed.offset, Offset::new(4, 5, 6));
        assert_eq!(parsed.pixels, pixels);
    }

    #[test]
    fn test_encode_png_produces_png_signature() {
        let png = encode_png(1, 1, &[Color::WHITE]).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    // ── parse_frame ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_huge_dimensions_is_error_not_overflow() {
        // Arrange
        let bytes = b"P6\n4294967295 4294967295\n255\n\x00\x00\x00";

        // Act
        let result = parse_frame(bytes);

        // Assert
        assert!(matches!(result, Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_parse_q7_rejects_png_smaller_than_header() {
        // Arrange
        let png = encode_png(2, 2, &solid(2, 2, Color::RED)).unwrap();
        let bytes = encode_q7(5, 5, Offset::default(), &png);

        // Act
        let result = parse_frame(&bytes);

        // Assert
        assert!(matches!(result, Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_parse_plain_frame_reads_layer_from_footer() {
        let bytes = encode_plain(1, 1, 9, &[Color::WHITE]).unwrap();
        let parsed = parse_frame(&bytes).unwrap();
        assert_eq!(parsed.offset, Offset::new(0, 0, 9));
        assert_eq!(parsed.kind, FrameKind::Offset);
        assert_eq!(parsed.pixels, vec![Color::WHITE]);
    }

    #[test]
    fn test_parse_bare_p6_is_plain_with_zero_offset() {
        let parsed = parse_frame(b"P6\n1 1\n255\n\x01\x02\x03").unwrap();
        assert_eq!(parsed.kind, FrameKind::Plain);
        assert_eq!(parsed.offset, Offset::default());
    }

    #[test]
    fn test_parse_footer_overrides_comment_offset() {
        let mut bytes = b"P6\n1 1\n#FT: 1 2 3\n255\n\x00\x00\x00".to_vec();
        bytes.extend_from_slice(b"7\n8\n9\n");
        let parsed = parse_frame(&bytes).unwrap();
        assert_eq!(parsed.offset, Offset::new(7, 8, 9));
    }

    #[test]
    fn test_parse_skips_ordinary_comments() {
        let parsed = parse_frame(b"P6\n# made by hand\n1 1\n255\n\x05\x06\x07").unwrap();
        assert_eq!(parsed.pixels, vec![Color::new(5, 6, 7)]);
    }

    #[test]
    fn test_parse_reports_truncated_pixel_data() {
        let result = parse_frame(b"P6\n2 2\n255\n\x00\x00\x00");
        assert_eq!(
            result,
            Err(FrameError::Truncated {
                needed: 12,
                available: 3
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_magic() {
        assert!(matches!(parse_frame(b"GIF89a"), Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_unsupported_channel_range() {
        assert!(matches!(
            parse_frame(b"P6\n1 1\n65535\n\x00\x00\x00\x00\x00\x00"),
            Err(FrameError::Malformed(_))
        ));
    }
}
