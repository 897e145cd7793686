//! Server endpoint parsing and resolution.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use ft_core::DEFAULT_PORT;
use thiserror::Error;

/// Environment variable naming the display as `host[:port]`.
pub const FT_DISPLAY_VAR: &str = "FT_DISPLAY";

/// Host used when neither an argument nor `FT_DISPLAY` names one.
pub const DEFAULT_HOST: &str = "ft.noise";

/// Errors parsing an endpoint string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The text after the colon is not a port number.
    #[error("invalid port {value:?} in display address")]
    InvalidPort { value: String },
}

/// A display server address as given by the user.
///
/// Resolution is deferred to [`Endpoint::resolve`] so that configuration can
/// be parsed without touching DNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Reads `FT_DISPLAY`, falling back to `ft.noise:1337` when it is unset
    /// or empty.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidPort`] if the variable carries a
    /// malformed port.
    pub fn from_env() -> Result<Self, EndpointError> {
        Self::from_display_var(std::env::var(FT_DISPLAY_VAR).ok().as_deref())
    }

    /// Parses an optional `FT_DISPLAY` value with the same fallbacks as
    /// [`Endpoint::from_env`].
    pub fn from_display_var(value: Option<&str>) -> Result<Self, EndpointError> {
        match value {
            Some(v) if !v.is_empty() => v.parse(),
            _ => Ok(Self::default()),
        }
    }

    /// Resolves to a socket address, preferring IPv4.
    ///
    /// # Errors
    ///
    /// Returns the resolver's I/O error, or `NotFound` when the name has no
    /// addresses.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses found for {self}"),
                )
            })
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    /// Parses `host[:port]`.  The first colon splits host from port; an empty
    /// host means [`DEFAULT_HOST`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| EndpointError::InvalidPort {
                    value: port.to_string(),
                })?;
                (host, port)
            }
            None => (s, DEFAULT_PORT),
        };
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
