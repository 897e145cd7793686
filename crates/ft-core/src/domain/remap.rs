//! Coordinate remapping for displays that are not a dense rectangular grid.
//!
//! Some installations are wired as a single long LED chain that snakes
//! through an irregular physical shape.  The chain is addressed as one row
//! (`x = index`, `y = 0`) on the server, while drawing code wants to think in
//! 2-D.  A [`CoordinateTable`] bridges the two: it maps each logical `(x, y)`
//! to a position on the chain, or to nothing where no LED exists.
//!
//! The table is described by:
//!
//! * an ordered list of **segment** lengths.  Segments are laid end to end on
//!   the chain, so segment `i` starts at the sum of the lengths before it.
//! * a list of [`Run`]s.  A run places one or more segments on a straight
//!   horizontal or vertical line starting at `(x, y)`.  The run's chain
//!   indices are contiguous, starting at the first listed segment's start.
//!
//! Runs are applied in order; a later run overwrites any cell an earlier run
//! already assigned.

use thiserror::Error;
use tracing::debug;

use crate::domain::color::Color;
use crate::domain::display::{Display, DisplayError};

/// Errors raised while building or using a coordinate table.
#[derive(Debug, Error)]
pub enum RemapError {
    /// A segment id is not in the segment table.
    #[error("unknown segment {id} (table has {count} segments)")]
    UnknownSegment { id: usize, count: usize },

    /// A run extends past the logical grid.
    #[error("run #{run} at ({x}, {y}) with length {length} leaves the {width}x{height} grid")]
    RunOutOfBounds {
        run: usize,
        x: u32,
        y: u32,
        length: usize,
        width: u32,
        height: u32,
    },

    /// A run lists no segments.
    #[error("run #{run} has no segments")]
    EmptyRun { run: usize },

    /// The wrapped display is shorter than the chain the table addresses.
    #[error("inner display is {available} pixels wide but the segments need {needed}")]
    InnerTooShort { needed: usize, available: u32 },

    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Segment start offsets derived from an ordered list of lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    /// `(start, len)` per segment.
    segments: Vec<(usize, usize)>,
}

impl SegmentTable {
    pub fn new(lengths: &[usize]) -> Self {
        let mut start = 0;
        let segments = lengths
            .iter()
            .map(|&len| {
                let seg = (start, len);
                start += len;
                seg
            })
            .collect();
        Self { segments }
    }

    /// `(start, len)` of segment `id`.
    ///
    /// # Errors
    ///
    /// [`RemapError::UnknownSegment`] if `id` is out of range.
    pub fn segment(&self, id: usize) -> Result<(usize, usize), RemapError> {
        self.segments
            .get(id)
            .copied()
            .ok_or(RemapError::UnknownSegment {
                id,
                count: self.segments.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Length of the whole chain.
    pub fn total_len(&self) -> usize {
        self.segments.last().map_or(0, |&(start, len)| start + len)
    }
}

/// Orientation of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// One straight line of segments in the logical grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// Segments laid left to right from `(x, y)`.
    Horizontal { x: u32, y: u32, segments: Vec<usize> },
    /// Segments laid top to bottom from `(x, y)`.
    Vertical { x: u32, y: u32, segments: Vec<usize> },
}

impl Run {
    pub fn new(direction: Direction, x: u32, y: u32, segments: Vec<usize>) -> Self {
        match direction {
            Direction::Horizontal => Run::Horizontal { x, y, segments },
            Direction::Vertical => Run::Vertical { x, y, segments },
        }
    }

    fn parts(&self) -> (Direction, u32, u32, &[usize]) {
        match self {
            Run::Horizontal { x, y, segments } => (Direction::Horizontal, *x, *y, segments),
            Run::Vertical { x, y, segments } => (Direction::Vertical, *x, *y, segments),
        }
    }
}

/// Read-only `(x, y) → chain index` lookup built once from segments and runs.
#[derive(Debug, Clone)]
pub struct CoordinateTable {
    width: u32,
    height: u32,
    segments: SegmentTable,
    /// Row-major over `width × height`.
    cells: Vec<Option<usize>>,
}

impl CoordinateTable {
    /// Builds the table, applying `runs` in order.
    ///
    /// # Errors
    ///
    /// * [`RemapError::Display`] wrapping `InvalidDimension` for a zero-sized grid.
    /// * [`RemapError::EmptyRun`] for a run without segments.
    /// * [`RemapError::UnknownSegment`] for a segment id not in `lengths`.
    /// * [`RemapError::RunOutOfBounds`] for a run that leaves the grid.
    pub fn build(
        width: u32,
        height: u32,
        lengths: &[usize],
        runs: &[Run],
    ) -> Result<Self, RemapError> {
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidDimension { width, height }.into());
        }
        let segments = SegmentTable::new(lengths);
        let mut cells = vec![None; width as usize * height as usize];

        for (run_index, run) in runs.iter().enumerate() {
            let (direction, x, y, ids) = run.parts();
            let first = *ids.first().ok_or(RemapError::EmptyRun { run: run_index })?;
            let start = segments.segment(first)?.0;
            let mut length = 0;
            for &id in ids {
                length += segments.segment(id)?.1;
            }

            let (along, limit) = match direction {
                Direction::Horizontal => (x as usize, width as usize),
                Direction::Vertical => (y as usize, height as usize),
            };
            if x >= width || y >= height || along + length > limit {
                return Err(RemapError::RunOutOfBounds {
                    run: run_index,
                    x,
                    y,
                    length,
                    width,
                    height,
                });
            }

            for i in 0..length {
                let (cx, cy) = match direction {
                    Direction::Horizontal => (x as usize + i, y as usize),
                    Direction::Vertical => (x as usize, y as usize + i),
                };
                cells[cy * width as usize + cx] = Some(start + i);
            }
        }

        debug!(
            width,
            height,
            segments = segments.len(),
            runs = runs.len(),
            "coordinate table built"
        );
        Ok(Self {
            width,
            height,
            segments,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    /// Chain index for `(x, y)`, or `None` if no element lives there.
    pub fn lookup(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Number of coordinates that resolve to an index.
    pub fn mapped_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// A single-row display addressed through a [`CoordinateTable`].
pub struct RemappedDisplay<D> {
    inner: D,
    table: CoordinateTable,
}

impl<D: Display> RemappedDisplay<D> {
    /// Wraps `inner`, whose row 0 holds the chain.
    ///
    /// # Errors
    ///
    /// [`RemapError::InnerTooShort`] if `inner` cannot hold every segment.
    pub fn new(inner: D, table: CoordinateTable) -> Result<Self, RemapError> {
        let needed = table.segments().total_len();
        if (inner.width() as usize) < needed {
            return Err(RemapError::InnerTooShort {
                needed,
                available: inner.width(),
            });
        }
        Ok(Self { inner, table })
    }

    pub fn table(&self) -> &CoordinateTable {
        &self.table
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    /// Sets every element of segment `id`, bypassing the 2-D table.
    ///
    /// # Errors
    ///
    /// [`RemapError::UnknownSegment`] if `id` is out of range.
    pub fn fill_segment(&mut self, id: usize, color: Color) -> Result<(), RemapError> {
        let (start, len) = self.table.segments().segment(id)?;
        for index in start..start + len {
            self.inner.set(index as i32, 0, color);
        }
        Ok(())
    }
}

impl<D: Display> Display for RemappedDisplay<D> {
    fn width(&self) -> u32 {
        self.table.width()
    }

    fn height(&self) -> u32 {
        self.table.height()
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(index) = self.table.lookup(x, y) {
            self.inner.set(index as i32, 0, color);
        }
    }

    fn get(&self, x: i32, y: i32) -> Option<Color> {
        let index = self.table.lookup(x, y)?;
        self.inner.get(index as i32, 0)
    }

    fn clear(&mut self) {
        self.inner.clear()
    }

    fn send(&mut self) -> Result<(), DisplayError> {
        self.inner.send()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::framebuffer::FrameBuffer;

    /// Single-row buffer that counts sends.
    struct Strip {
        fb: FrameBuffer,
        sends: usize,
    }

    impl Strip {
        fn new(len: u32) -> Self {
            Self {
                fb: FrameBuffer::new(len, 1, 0, true).unwrap(),
                sends: 0,
            }
        }

        fn lit(&self) -> Vec<usize> {
            self.fb
                .pixels()
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_black())
                .map(|(i, _)| i)
                .collect()
        }
    }

    impl Display for Strip {
        fn width(&self) -> u32 {
            self.fb.width()
        }
        fn height(&self) -> u32 {
            1
        }
        fn set(&mut self, x: i32, y: i32, color: Color) {
            self.fb.set(x, y, color)
        }
        fn get(&self, x: i32, y: i32) -> Option<Color> {
            self.fb.get(x, y)
        }
        fn clear(&mut self) {
            self.fb.clear()
        }
        fn send(&mut self) -> Result<(), DisplayError> {
            self.sends += 1;
            Ok(())
        }
    }

    /// An "L": segments 0 and 1 along the top row, segment 2 down the left.
    ///
    /// ```text
    /// lengths = [3, 2, 4]      starts = [0, 3, 5]
    /// row 0:           0 1 2 3 4 .
    /// col 0, rows 1-4: 5 6 7 8
    /// ```
    fn l_shape() -> CoordinateTable {
        CoordinateTable::build(
            6,
            5,
            &[3, 2, 4],
            &[
                Run::Horizontal { x: 0, y: 0, segments: vec![0, 1] },
                Run::Vertical { x: 0, y: 1, segments: vec![2] },
            ],
        )
        .unwrap()
    }

    // ── SegmentTable ─────────────────────────────────────────────────────────

    #[test]
    fn test_segment_table_starts_are_cumulative() {
        let table = SegmentTable::new(&[41, 26, 105]);
        assert_eq!(table.segment(0).unwrap(), (0, 41));
        assert_eq!(table.segment(1).unwrap(), (41, 26));
        assert_eq!(table.segment(2).unwrap(), (67, 105));
        assert_eq!(table.total_len(), 172);
    }

    #[test]
    fn test_segment_table_rejects_unknown_id() {
        let table = SegmentTable::new(&[1]);
        assert!(matches!(
            table.segment(1),
            Err(RemapError::UnknownSegment { id: 1, count: 1 })
        ));
    }

    // ── CoordinateTable::build ───────────────────────────────────────────────

    #[test]
    fn test_build_horizontal_run_is_contiguous_from_first_segment() {
        let table = l_shape();
        let row: Vec<_> = (0..6).map(|x| table.lookup(x, 0)).collect();
        assert_eq!(row, vec![Some(0), Some(1), Some(2), Some(3), Some(4), None]);
    }

    #[test]
    fn test_build_vertical_run_counts_down_the_column() {
        let table = l_shape();
        let col: Vec<_> = (1..5).map(|y| table.lookup(0, y)).collect();
        assert_eq!(col, vec![Some(5), Some(6), Some(7), Some(8)]);
    }

    #[test]
    fn test_build_run_starting_mid_chain_uses_segment_start() {
        let table =
            CoordinateTable::build(4, 1, &[3, 2], &[Run::Horizontal { x: 1, y: 0, segments: vec![1] }])
                .unwrap();
        assert_eq!(table.lookup(1, 0), Some(3));
        assert_eq!(table.lookup(2, 0), Some(4));
        assert_eq!(table.lookup(0, 0), None);
    }

    #[test]
    fn test_build_later_run_overwrites_earlier() {
        let table = CoordinateTable::build(
            3,
            3,
            &[3, 3],
            &[
                Run::Horizontal { x: 0, y: 0, segments: vec![0] },
                Run::Vertical { x: 0, y: 0, segments: vec![1] },
            ],
        )
        .unwrap();
        assert_eq!(table.lookup(0, 0), Some(3));
        assert_eq!(table.lookup(1, 0), Some(1));
    }

    #[test]
    fn test_build_rejects_run_leaving_grid() {
        let err = CoordinateTable::build(
            4,
            4,
            &[5],
            &[Run::Horizontal { x: 0, y: 0, segments: vec![0] }],
        )
        .unwrap_err();
        assert!(matches!(err, RemapError::RunOutOfBounds { run: 0, length: 5, .. }));
    }

    #[test]
    fn test_build_rejects_run_starting_outside_grid() {
        let err =
            CoordinateTable::build(4, 4, &[1], &[Run::Vertical { x: 4, y: 0, segments: vec![0] }])
                .unwrap_err();
        assert!(matches!(err, RemapError::RunOutOfBounds { .. }));
    }

    #[test]
    fn test_build_rejects_empty_run() {
        let err =
            CoordinateTable::build(4, 4, &[1], &[Run::Vertical { x: 0, y: 0, segments: vec![] }])
                .unwrap_err();
        assert!(matches!(err, RemapError::EmptyRun { run: 0 }));
    }

    #[test]
    fn test_build_rejects_unknown_segment() {
        let err =
            CoordinateTable::build(4, 4, &[1], &[Run::Vertical { x: 0, y: 0, segments: vec![3] }])
                .unwrap_err();
        assert!(matches!(err, RemapError::UnknownSegment { id: 3, .. }));
    }

    #[test]
    fn test_build_rejects_zero_sized_grid() {
        assert!(matches!(
            CoordinateTable::build(0, 4, &[], &[]),
            Err(RemapError::Display(DisplayError::InvalidDimension { .. }))
        ));
    }

    #[test]
    fn test_lookup_outside_grid_is_none() {
        let table = l_shape();
        assert_eq!(table.lookup(-1, 0), None);
        assert_eq!(table.lookup(0, 5), None);
        assert_eq!(table.mapped_count(), 9);
    }

    // ── RemappedDisplay ──────────────────────────────────────────────────────

    #[test]
    fn test_remapped_set_writes_chain_index_on_row_zero() {
        // Arrange
        let mut display = RemappedDisplay::new(Strip::new(9), l_shape()).unwrap();

        // Act
        display.set(0, 3, Color::RED);

        // Assert
        assert_eq!(display.inner().lit(), vec![7]);
        assert_eq!(display.get(0, 3), Some(Color::RED));
    }

    #[test]
    fn test_remapped_set_on_unmapped_coordinate_touches_nothing() {
        let mut display = RemappedDisplay::new(Strip::new(9), l_shape()).unwrap();

        display.set(3, 3, Color::RED);
        display.set(5, 0, Color::RED);
        display.set(-2, 7, Color::RED);

        assert!(display.inner().lit().is_empty());
        assert_eq!(display.get(3, 3), None);
    }

    #[test]
    fn test_fill_segment_sets_whole_segment() {
        let mut display = RemappedDisplay::new(Strip::new(9), l_shape()).unwrap();
        display.fill_segment(1, Color::BLUE).unwrap();
        assert_eq!(display.inner().lit(), vec![3, 4]);
    }

    #[test]
    fn test_fill_segment_rejects_unknown_id() {
        let mut display = RemappedDisplay::new(Strip::new(9), l_shape()).unwrap();
        assert!(display.fill_segment(3, Color::BLUE).is_err());
    }

    #[test]
    fn test_remapped_new_rejects_short_inner_display() {
        assert!(matches!(
            RemappedDisplay::new(Strip::new(8), l_shape()),
            Err(RemapError::InnerTooShort { needed: 9, available: 8 })
        ));
    }

    #[test]
    fn test_remapped_reports_logical_extents_and_delegates_send() {
        let mut display = RemappedDisplay::new(Strip::new(9), l_shape()).unwrap();
        display.send().unwrap();
        assert_eq!((display.width(), display.height()), (6, 5));
        assert_eq!(display.inner().sends, 1);
    }
}
