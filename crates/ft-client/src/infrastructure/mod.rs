//! Infrastructure layer for the client application.
//!
//! Contains the OS-facing adapters: UDP network I/O and configuration files.
//!
//! **Dependency rule**: this layer may depend on `application` and `ft_core`,
//! but MUST NOT be imported by `ft_core`.
//!
//! # Sub-modules
//!
//! - **`network`** – Endpoint parsing, the UDP `DisplayLink`, and
//!   `NetworkDisplay`, which binds a framebuffer to a link.
//!
//! - **`storage`** – TOML configuration with environment overrides.

pub mod network;
pub mod storage;
