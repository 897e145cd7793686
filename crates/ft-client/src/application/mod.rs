//! Application layer use cases for the client.
//!
//! - **`compose`** – Turns configuration into sendable displays: a single
//!   panel, a multi-panel canvas, slices of one wide image, or a remapped
//!   LED chain.
//!
//! - **`stream`** – Sends a still image or an animation in the background at
//!   a fixed pace, with cooperative stop and a per-session timeout.

pub mod compose;
pub mod stream;
