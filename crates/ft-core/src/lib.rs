//! # ft-core
//!
//! Shared library for the Flaschen Taschen client containing the pixel
//! framebuffer, display composition, coordinate remapping, and the wire
//! codec for the three frame formats the server accepts.
//!
//! It has zero dependencies on network sockets or threads; those live in
//! `ft-client`.
//!
//! # Architecture overview (for beginners)
//!
//! A Flaschen Taschen is a wall of LEDs driven by a server that listens for
//! UDP datagrams.  Each datagram carries one image (a "frame") in a small
//! text-headed format derived from binary PPM.  A client keeps an in-memory
//! copy of the pixels, draws into it, and sends the whole thing whenever it
//! wants the wall to update.
//!
//! This crate (`ft-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How pixels become bytes.  Plain frames, offset frames
//!   (with a `#FT:` placement comment), and Q7 frames (with a PNG payload),
//!   plus a parser that reads them back the way the server does.
//!
//! - **`domain`** – Pure logic with no I/O.  The [`FrameBuffer`] holds one
//!   display's pixels, the [`Display`] trait is the seam every sendable
//!   surface implements, [`UnifiedCanvas`] stitches several displays into one
//!   coordinate space, and [`RemappedDisplay`] addresses an irregular LED
//!   chain through a 2-D lookup table.

pub mod domain;
pub mod protocol;

pub use domain::canvas::{CanvasSendError, MemberFailure, Owner, Placement, UnifiedCanvas};
pub use domain::color::Color;
pub use domain::display::{Display, DisplayError, TransmissionError};
pub use domain::framebuffer::FrameBuffer;
pub use domain::remap::{
    CoordinateTable, Direction, RemapError, RemappedDisplay, Run, SegmentTable,
};
pub use protocol::frame::{
    parse_frame, FrameError, FrameKind, Offset, ParsedFrame, DEFAULT_PORT, HEADER_RESERVE,
    MAX_DATAGRAM_SIZE,
};
