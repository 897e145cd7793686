//! TOML-based configuration for the client.
//!
//! Reads and writes [`ClientConfig`] at the platform-appropriate path:
//! - Windows:  `%APPDATA%\Flaschen\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/flaschen/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/Flaschen/config.toml`
//!
//! Example:
//!
//! ```toml
//! [display]
//! host = "ft.noise"
//! port = 1337
//! width = 45
//! height = 35
//! layer = 5
//!
//! [stream]
//! interval_ms = 100
//! timeout_ms = 5000
//! format = "q7"
//!
//! [[canvas.members]]
//! host = "left.local"
//! width = 45
//! height = 35
//! x_offset = 0
//! y_offset = 0
//!
//! [remap]
//! host = "shelf.local"
//! width = 10
//! height = 5
//! segments = [10, 5]
//! runs = [
//!     { direction = "horizontal", x = 0, y = 0, segments = [0] },
//!     { direction = "vertical", x = 9, y = 0, segments = [1] },
//! ]
//! ```
//!
//! # Environment overrides
//!
//! After the file is read, these variables override the `[display]` section,
//! in this order:
//!
//! | Variable      | Field                         |
//! |---------------|-------------------------------|
//! | `FT_DISPLAY`  | `host` and `port` (`host[:port]`) |
//! | `FT_HOST`     | `host`                        |
//! | `FT_PORT`     | `port`                        |
//! | `FT_WIDTH`    | `width`                       |
//! | `FT_HEIGHT`   | `height`                      |
//! | `FT_LAYER`    | `layer`                       |
//! | `FT_UDP_SIZE` | `udp_size`                    |
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = ...)]`, so an empty file (or no file
//! at all) yields [`ClientConfig::default`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ft_core::{Direction, Run, DEFAULT_PORT, MAX_DATAGRAM_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::stream::StreamFormat;
use crate::infrastructure::network::Endpoint;

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override holds a value of the wrong shape.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remap: Option<RemapConfig>,
}

/// The primary display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_layer")]
    pub layer: u8,
    /// Send black as black, letting lower layers show through.
    #[serde(default)]
    pub transparent: bool,
    /// Largest datagram to send when tiling offset frames.
    #[serde(default = "default_udp_size")]
    pub udp_size: usize,
}

/// Streaming defaults for the `stream` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub format: StreamFormat,
}

/// Displays composed into one canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanvasConfig {
    #[serde(default)]
    pub members: Vec<CanvasMemberConfig>,
}

/// One canvas member and where it sits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanvasMemberConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_layer")]
    pub layer: u8,
    #[serde(default)]
    pub transparent: bool,
    /// Position in the canvas.
    #[serde(default)]
    pub x_offset: u32,
    #[serde(default)]
    pub y_offset: u32,
    /// Send offset frames placed at `(x_offset, y_offset)` on the server
    /// instead of plain frames.  Used when several members share one server.
    #[serde(default)]
    pub place_on_server: bool,
}

/// An irregular single-chain display addressed through a coordinate table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemapConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_layer")]
    pub layer: u8,
    #[serde(default)]
    pub transparent: bool,
    /// Logical grid width.
    pub width: u32,
    /// Logical grid height.
    pub height: u32,
    /// Segment lengths in chain order.
    pub segments: Vec<usize>,
    #[serde(default)]
    pub runs: Vec<RunConfig>,
}

/// One straight run of segments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub direction: RunDirection,
    pub x: u32,
    pub y: u32,
    pub segments: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunDirection {
    Horizontal,
    Vertical,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_width() -> u32 {
    45
}
fn default_height() -> u32 {
    35
}
fn default_layer() -> u8 {
    5
}
fn default_udp_size() -> usize {
    MAX_DATAGRAM_SIZE
}
fn default_interval_ms() -> u64 {
    100
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            width: default_width(),
            height: default_height(),
            layer: default_layer(),
            transparent: false,
            udp_size: default_udp_size(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: 0,
            format: StreamFormat::default(),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl DisplayConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

impl CanvasMemberConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

impl RemapConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// The runs as domain values, in file order.
    pub fn runs(&self) -> Vec<Run> {
        self.runs.iter().map(RunConfig::to_run).collect()
    }
}

impl RunConfig {
    pub fn to_run(&self) -> Run {
        let direction = match self.direction {
            RunDirection::Horizontal => Direction::Horizontal,
            RunDirection::Vertical => Direction::Vertical,
        };
        Run::new(direction, self.x, self.y, self.segments.clone())
    }
}

// ── Environment overrides ─────────────────────────────────────────────────────

impl ClientConfig {
    /// Applies the `FT_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for a malformed value.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Applies the `FT_*` overrides using `lookup` to read variables.
    ///
    /// Unset and empty variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for a malformed value.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());
        let display = &mut self.display;

        if let Some(value) = get("FT_DISPLAY") {
            let endpoint = Endpoint::from_str(&value).map_err(|_| ConfigError::InvalidEnv {
                var: "FT_DISPLAY",
                value: value.clone(),
            })?;
            display.host = endpoint.host;
            display.port = endpoint.port;
        }
        if let Some(value) = get("FT_HOST") {
            display.host = value;
        }
        if let Some(value) = get("FT_PORT") {
            display.port = parse_env("FT_PORT", value)?;
        }
        if let Some(value) = get("FT_WIDTH") {
            display.width = parse_env("FT_WIDTH", value)?;
        }
        if let Some(value) = get("FT_HEIGHT") {
            display.height = parse_env("FT_HEIGHT", value)?;
        }
        if let Some(value) = get("FT_LAYER") {
            display.layer = parse_env("FT_LAYER", value)?;
        }
        if let Some(value) = get("FT_UDP_SIZE") {
            display.udp_size = parse_env("FT_UDP_SIZE", value)?;
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from the platform path, returning defaults if the file
/// does not exist.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to the platform path.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &ClientConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `flaschen` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Flaschen"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Flaschen")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("flaschen"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
