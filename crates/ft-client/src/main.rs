//! Flaschen Taschen client: entry point.
//!
//! # Usage
//!
//! ```text
//! ft-client [OPTIONS] <COMMAND>
//!
//! Commands:
//!   clear    Send a fully transparent frame on every layer
//!   pattern  Draw a test gradient on the display, canvas, or remapped chain
//!   stream   Stream a generated animation until it finishes or Ctrl-C
//!   save-config  Write the effective settings to the config file
//!
//! Options:
//!   --config <PATH>     Config file [env: FT_CONFIG]
//!   --display <HOST[:PORT]>
//!   --width <W> --height <H> --layer <Z>
//! ```
//!
//! # Settings precedence
//!
//! Built-in defaults, then the config file, then `FT_*` environment
//! variables, then command-line flags.  Logging honours `RUST_LOG` and
//! defaults to `info`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ft_client::application::compose::{build_canvas, build_display, build_remapped};
use ft_client::application::stream::{AnimatedStreamer, GeneratedFrames, StreamFormat, StreamOptions};
use ft_client::infrastructure::network::{DisplayLink, Endpoint};
use ft_client::infrastructure::storage::config::{
    load_config, load_config_from, save_config, save_config_to, ClientConfig,
};
use ft_core::{Color, Display, FrameBuffer, Offset};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line client for Flaschen Taschen LED displays.
#[derive(Debug, Parser)]
#[command(name = "ft-client", about = "Send frames to a Flaschen Taschen display", version)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, env = "FT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Display server as `host[:port]`.
    #[arg(long, global = true)]
    display: Option<Endpoint>,

    /// Display width in pixels.
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Display height in pixels.
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Server layer to draw on.
    #[arg(long, global = true)]
    layer: Option<u8>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a fully transparent frame on layers `0..N`.
    Clear {
        /// Number of layers to clear.
        #[arg(long, default_value_t = 17)]
        layers: u8,
    },

    /// Draw a colour gradient test pattern and send it once.
    Pattern(PatternArgs),

    /// Stream a generated animation.
    Stream(StreamArgs),

    /// Write the effective settings (file, environment, flags) to the
    /// config file, or to `--config` when given.
    SaveConfig,
}

#[derive(Debug, Args)]
struct PatternArgs {
    /// Draw across every `[[canvas.members]]` display.
    #[arg(long, conflicts_with = "remap")]
    canvas: bool,

    /// Draw through the `[remap]` coordinate table.
    #[arg(long)]
    remap: bool,
}

#[derive(Debug, Args)]
struct StreamArgs {
    /// Minimum milliseconds between frames; 0 means 100.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Keep streaming for this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Send PNG-compressed Q7 frames.
    #[arg(long, conflicts_with = "raw")]
    q7: bool,

    /// Send uncompressed offset frames.
    #[arg(long)]
    raw: bool,

    /// Frames in one pass of the animation.
    #[arg(long, default_value_t = 45)]
    frames: usize,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    info!(
        display = %config.display.endpoint(),
        width = config.display.width,
        height = config.display.height,
        layer = config.display.layer,
        "ft-client starting"
    );

    match cli.command {
        Command::Clear { layers } => clear_layers(&config, layers),
        Command::Pattern(args) => draw_pattern(&config, &args),
        Command::Stream(args) => stream_animation(&config, &args).await,
        Command::SaveConfig => save_settings(&config, cli.config.as_deref()),
    }
}

/// Defaults, then file, then environment, then flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => load_config().unwrap_or_else(|e| {
            warn!("using default config: {e}");
            ClientConfig::default()
        }),
    };
    config
        .apply_env()
        .context("invalid FT_* environment override")?;

    if let Some(endpoint) = &cli.display {
        config.display.host = endpoint.host.clone();
        config.display.port = endpoint.port;
    }
    if let Some(width) = cli.width {
        config.display.width = width;
    }
    if let Some(height) = cli.height {
        config.display.height = height;
    }
    if let Some(layer) = cli.layer {
        config.display.layer = layer;
    }
    Ok(config)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn clear_layers(config: &ClientConfig, layers: u8) -> anyhow::Result<()> {
    let endpoint = config.display.endpoint();
    let mut link = DisplayLink::connect(&endpoint)
        .with_context(|| format!("cannot open link to {endpoint}"))?;

    for layer in 0..layers {
        let blank = FrameBuffer::new(config.display.width, config.display.height, layer, true)?;
        if let Err(e) = link.transmit(&blank.encode()) {
            warn!(layer, "clear failed: {e}");
        }
    }
    info!(layers, "layers cleared");
    link.close();
    Ok(())
}

fn draw_pattern(config: &ClientConfig, args: &PatternArgs) -> anyhow::Result<()> {
    if args.canvas {
        let mut canvas = build_canvas(config).context("cannot build canvas")?;
        paint_gradient(&mut canvas);
        canvas.send().context("canvas send failed")?;
    } else if args.remap {
        let remap = config
            .remap
            .as_ref()
            .context("no [remap] section in config")?;
        let mut display = build_remapped(remap).context("cannot build remapped display")?;
        paint_gradient(&mut display);
        display.send().context("remapped send failed")?;
    } else {
        let mut display = build_display(&config.display).context("cannot open display")?;
        paint_gradient(&mut display);
        display.send().context("send failed")?;
    }
    info!("pattern sent");
    Ok(())
}

async fn stream_animation(config: &ClientConfig, args: &StreamArgs) -> anyhow::Result<()> {
    let endpoint = config.display.endpoint();
    let link = DisplayLink::connect(&endpoint)
        .with_context(|| format!("cannot open link to {endpoint}"))?;

    let format = if args.raw {
        StreamFormat::Raw
    } else if args.q7 {
        StreamFormat::Q7
    } else {
        config.stream.format
    };
    let options = StreamOptions {
        interval: Duration::from_millis(args.interval_ms.unwrap_or(config.stream.interval_ms)),
        timeout: Duration::from_millis(args.timeout_ms.unwrap_or(config.stream.timeout_ms)),
        format,
        offset: Offset::new(0, 0, config.display.layer),
        max_datagram: config.display.udp_size,
    };

    let background = FrameBuffer::new(
        config.display.width,
        config.display.height,
        config.display.layer,
        config.display.transparent,
    )?;
    let frames = args.frames.max(1);
    let source = GeneratedFrames::new(frames, move |i| sweep_frame(&background, i, frames));

    let mut streamer = AnimatedStreamer::new(link);
    streamer.start(source, options)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received, stopping stream");
                streamer.stop();
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if !streamer.is_running() {
                    break;
                }
            }
        }
    }

    let summary = streamer.wait()?;
    info!(
        sent = summary.frames_sent,
        failed = summary.send_failures,
        stopped = summary.stopped_early,
        "stream finished"
    );
    Ok(())
}

fn save_settings(config: &ClientConfig, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => save_config_to(config, path)
            .with_context(|| format!("failed to write config to {}", path.display()))?,
        None => save_config(config).context("failed to write config")?,
    }
    info!("config saved");
    Ok(())
}

// ── Drawing ───────────────────────────────────────────────────────────────────

fn paint_gradient<D: Display>(display: &mut D) {
    let (w, h) = (display.width().max(1), display.height().max(1));
    for y in 0..h {
        for x in 0..w {
            let color = Color::new((x * 255 / w) as u8, (y * 255 / h) as u8, 128);
            display.set(x as i32, y as i32, color);
        }
    }
}

/// One frame of a vertical bar sweeping left to right over a dim background.
fn sweep_frame(background: &FrameBuffer, index: usize, frames: usize) -> FrameBuffer {
    let mut fb = background.clone();
    fb.fill(Color::new(0, 0, 40));
    let bar = (index as u64 * u64::from(fb.width()) / frames as u64) as i32;
    let hue = (index * 255 / frames) as u8;
    for y in 0..fb.height() as i32 {
        fb.set(bar, y, Color::new(255, hue, 255 - hue));
    }
    fb
}

// ── Tests ─────────────────────────────────────────────────────────────────────
