//! Persistent client settings.

pub mod config;
