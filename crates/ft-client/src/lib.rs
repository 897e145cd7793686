//! ft-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does ft-client do? (for beginners)
//!
//! `ft-core` knows how to hold pixels and turn them into frames.  This crate
//! puts those frames on the network:
//!
//! 1. Resolves the server address (`FT_DISPLAY`, config file, or CLI).
//! 2. Opens a connected UDP socket per display ([`DisplayLink`]).
//! 3. Binds framebuffers to links ([`NetworkDisplay`]) so that `send()`
//!    encodes and transmits in one call.
//! 4. Streams still images and animations from a background thread
//!    ([`AnimatedStreamer`]).
//!
//! [`DisplayLink`]: infrastructure::network::DisplayLink
//! [`NetworkDisplay`]: infrastructure::network::NetworkDisplay
//! [`AnimatedStreamer`]: application::stream::AnimatedStreamer

/// Application layer: composition and streaming use cases.
pub mod application;

/// Infrastructure layer: network and configuration adapters.
pub mod infrastructure;
