//! Domain entities for the Flaschen Taschen client.
//!
//! Everything here is pure: no sockets, no threads, no clocks.  Displays that
//! talk to the network are built in `ft-client` on top of the [`display::Display`]
//! trait defined here, which keeps composition and remapping testable with
//! in-memory displays.

/// Several displays addressed as one coordinate space.
pub mod canvas;
pub mod color;
/// The `Display` trait and the shared error types.
pub mod display;
/// One display's pixels and their encodings.
pub mod framebuffer;
/// 2-D addressing for irregular single-chain LED layouts.
pub mod remap;
