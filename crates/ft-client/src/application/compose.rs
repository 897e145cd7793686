//! Builds sendable displays from configuration.
//!
//! - [`build_display`]: the single `[display]` panel.
//! - [`build_canvas`]: every `[[canvas.members]]` entry placed on one canvas.
//! - [`sliced_canvas`]: one wide image on one server, cut into vertical
//!   slices that each travel as their own offset frame.
//! - [`build_remapped`]: the `[remap]` chain behind its coordinate table.

use ft_core::{
    CoordinateTable, DisplayError, FrameBuffer, Offset, RemapError, RemappedDisplay, UnifiedCanvas,
};
use thiserror::Error;
use tracing::info;

use crate::infrastructure::network::{DisplayLink, Endpoint, FrameMode, NetworkDisplay};
use crate::infrastructure::storage::config::{
    CanvasMemberConfig, ClientConfig, DisplayConfig, RemapConfig,
};

/// Errors assembling displays from configuration.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A member could not be opened.
    #[error("canvas member #{member}: {source}")]
    Member {
        member: usize,
        #[source]
        source: DisplayError,
    },

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Remap(#[from] RemapError),

    /// No `[[canvas.members]]` are configured.
    #[error("no canvas members configured")]
    EmptyCanvas,

    /// The requested slice count does not divide the width into usable slices.
    #[error("cannot cut width {width} into {count} slices")]
    BadSlices { width: u32, count: u32 },
}

/// Opens the primary display.
///
/// # Errors
///
/// Returns [`ComposeError::Display`] for bad dimensions or an unreachable host.
pub fn build_display(config: &DisplayConfig) -> Result<NetworkDisplay, ComposeError> {
    let display = NetworkDisplay::connect(
        &config.endpoint(),
        config.width,
        config.height,
        config.layer,
        config.transparent,
    )?
    .with_max_datagram(config.udp_size);
    Ok(display)
}

fn open_member(member: &CanvasMemberConfig) -> Result<NetworkDisplay, DisplayError> {
    let display = NetworkDisplay::connect(
        &member.endpoint(),
        member.width,
        member.height,
        member.layer,
        member.transparent,
    )?;
    if member.place_on_server {
        let offset = Offset::new(member.x_offset as i32, member.y_offset as i32, member.layer);
        Ok(display.with_mode(FrameMode::Offset(offset)))
    } else {
        Ok(display)
    }
}

/// Places every configured canvas member, in file order.
///
/// # Errors
///
/// - [`ComposeError::EmptyCanvas`] with no members configured.
/// - [`ComposeError::Member`] naming the first member that failed to open.
pub fn build_canvas(config: &ClientConfig) -> Result<UnifiedCanvas<NetworkDisplay>, ComposeError> {
    if config.canvas.members.is_empty() {
        return Err(ComposeError::EmptyCanvas);
    }
    let mut canvas = UnifiedCanvas::new();
    for (index, member) in config.canvas.members.iter().enumerate() {
        let display =
            open_member(member).map_err(|source| ComposeError::Member { member: index, source })?;
        canvas.add(display, member.x_offset, member.y_offset);
    }
    info!(
        members = canvas.len(),
        width = canvas.width(),
        height = canvas.height(),
        "canvas assembled"
    );
    Ok(canvas)
}

/// Cuts a `width × height` image into `count` side-by-side slices that share
/// one server link, each sent as an offset frame at its own `x`.
///
/// Slices are transparent so they compose over lower layers.
///
/// # Errors
///
/// - [`ComposeError::BadSlices`] if `count` is zero or wider than `width`.
/// - [`ComposeError::Display`] if the link cannot be opened.
pub fn sliced_canvas(
    endpoint: &Endpoint,
    width: u32,
    height: u32,
    count: u32,
    layer: u8,
) -> Result<UnifiedCanvas<NetworkDisplay>, ComposeError> {
    if count == 0 || count > width {
        return Err(ComposeError::BadSlices { width, count });
    }
    let slice_width = width / count;
    let mut canvas = UnifiedCanvas::new();
    for i in 0..count {
        let x = i * slice_width;
        let buffer = FrameBuffer::new(slice_width, height, layer, true)?;
        let link = DisplayLink::connect(endpoint)?;
        let display = NetworkDisplay::new(buffer, link)
            .with_mode(FrameMode::Offset(Offset::new(x as i32, 0, layer)));
        canvas.add(display, x, 0);
    }
    Ok(canvas)
}

/// Builds the remapped chain display from `[remap]`.
///
/// The inner display is one row exactly as long as the chain.
///
/// # Errors
///
/// - [`ComposeError::Remap`] if the table is inconsistent.
/// - [`ComposeError::Display`] if the link cannot be opened.
pub fn build_remapped(config: &RemapConfig) -> Result<RemappedDisplay<NetworkDisplay>, ComposeError> {
    let table = CoordinateTable::build(config.width, config.height, &config.segments, &config.runs())?;
    let chain = table.segments().total_len() as u32;
    let inner = NetworkDisplay::connect(
        &config.endpoint(),
        chain.max(1),
        1,
        config.layer,
        config.transparent,
    )?;
    info!(
        chain,
        mapped = table.mapped_count(),
        "remapped display ready"
    );
    Ok(RemappedDisplay::new(inner, table)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::config::{RunConfig, RunDirection};
    use ft_core::Display;

    fn member(x_offset: u32, place_on_server: bool) -> CanvasMemberConfig {
        CanvasMemberConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            width: 10,
            height: 10,
            layer: 2,
            transparent: false,
            x_offset,
            y_offset: 0,
            place_on_server,
        }
    }

    #[test]
    fn test_build_canvas_places_members_in_file_order() {
        let mut cfg = ClientConfig::default();
        cfg.canvas.members = vec![member(0, false), member(10, true)];

        let canvas = build_canvas(&cfg).unwrap();

        assert_eq!((canvas.width(), canvas.height()), (20, 10));
        assert_eq!(canvas.display(0).unwrap().mode(), FrameMode::Plain);
        assert_eq!(
            canvas.display(1).unwrap().mode(),
            FrameMode::Offset(Offset::new(10, 0, 2))
        );
    }

    #[test]
    fn test_build_canvas_without_members_is_error() {
        assert!(matches!(
            build_canvas(&ClientConfig::default()),
            Err(ComposeError::EmptyCanvas)
        ));
    }

    #[test]
    fn test_build_canvas_reports_failing_member_index() {
        let mut cfg = ClientConfig::default();
        let mut bad = member(10, false);
        bad.width = 0;
        cfg.canvas.members = vec![member(0, false), bad];

        assert!(matches!(
            build_canvas(&cfg),
            Err(ComposeError::Member { member: 1, .. })
        ));
    }

    #[test]
    fn test_sliced_canvas_cuts_width_into_offset_slices() {
        let endpoint = Endpoint::new("127.0.0.1", 9);

        let canvas = sliced_canvas(&endpoint, 45, 35, 3, 4).unwrap();

        assert_eq!(canvas.len(), 3);
        assert_eq!(canvas.width(), 45);
        let modes: Vec<FrameMode> = canvas.displays().map(|d| d.mode()).collect();
        assert_eq!(
            modes,
            vec![
                FrameMode::Offset(Offset::new(0, 0, 4)),
                FrameMode::Offset(Offset::new(15, 0, 4)),
                FrameMode::Offset(Offset::new(30, 0, 4)),
            ]
        );
        assert!(canvas.displays().all(|d| d.buffer().transparent()));
    }

    #[test]
    fn test_sliced_canvas_rejects_zero_slices() {
        let endpoint = Endpoint::new("127.0.0.1", 9);
        assert!(matches!(
            sliced_canvas(&endpoint, 45, 35, 0, 0),
            Err(ComposeError::BadSlices { .. })
        ));
    }

    #[test]
    fn test_build_remapped_sizes_inner_strip_to_chain() {
        let cfg = RemapConfig {
            host: "127.0.0.1".to_string(),
            port: 9,
            layer: 1,
            transparent: false,
            width: 4,
            height: 3,
            segments: vec![4, 2],
            runs: vec![
                RunConfig { direction: RunDirection::Horizontal, x: 0, y: 0, segments: vec![0] },
                RunConfig { direction: RunDirection::Vertical, x: 3, y: 1, segments: vec![1] },
            ],
        };

        let display = build_remapped(&cfg).unwrap();

        assert_eq!(display.inner().width(), 6);
        assert_eq!((display.width(), display.height()), (4, 3));
        assert_eq!(display.table().lookup(3, 2), Some(5));
    }
}
