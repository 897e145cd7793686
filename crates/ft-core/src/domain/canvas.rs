//! Unified canvas: several independently addressed displays as one surface.
//!
//! Each member display is placed at a non-negative `(x_offset, y_offset)` in
//! a shared coordinate space.  The canvas is as wide and tall as the furthest
//! placement reaches.  Writes are routed to the single member that owns the
//! coordinate, translated into that member's local coordinates.
//!
//! # Overlap
//!
//! Placements may overlap.  Ownership is decided per coordinate when a member
//! is added: the new member's rectangle is written over the ownership index,
//! so the most recently added member wins wherever rectangles intersect.
//!
//! # Sending
//!
//! [`UnifiedCanvas::send`] sends every member once, in insertion order.  A
//! failing member never prevents the remaining members from being attempted;
//! all failures are collected and returned together.

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::color::Color;
use crate::domain::display::{Display, DisplayError};

/// A member display together with its position in the canvas.
#[derive(Debug)]
pub struct Placement<D> {
    display: D,
    x_offset: u32,
    y_offset: u32,
}

impl<D: Display> Placement<D> {
    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn x_offset(&self) -> u32 {
        self.x_offset
    }

    pub fn y_offset(&self) -> u32 {
        self.y_offset
    }

    /// Exclusive right edge in canvas coordinates.
    pub fn right(&self) -> u32 {
        self.x_offset.saturating_add(self.display.width())
    }

    /// Exclusive bottom edge in canvas coordinates.
    pub fn bottom(&self) -> u32 {
        self.y_offset.saturating_add(self.display.height())
    }
}

/// The member owning a canvas coordinate, and the coordinate local to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// Insertion index of the member.
    pub member: usize,
    pub local_x: i32,
    pub local_y: i32,
}

/// One member's failure during [`UnifiedCanvas::send`].
#[derive(Debug, Error)]
#[error("display #{member} failed: {error}")]
pub struct MemberFailure {
    pub member: usize,
    #[source]
    pub error: DisplayError,
}

/// Every member failure from one [`UnifiedCanvas::send`] call.
#[derive(Debug, Error)]
#[error("{} of {attempted} displays failed to send", failures.len())]
pub struct CanvasSendError {
    /// Number of members a send was attempted on.
    pub attempted: usize,
    pub failures: Vec<MemberFailure>,
}

/// Several displays addressed as one rectangular coordinate space.
pub struct UnifiedCanvas<D> {
    members: Vec<Placement<D>>,
    /// Owning member per coordinate, row-major over `width × height`.
    owners: Vec<Option<usize>>,
    width: u32,
    height: u32,
}

impl<D: Display> UnifiedCanvas<D> {
    /// Creates an empty 0×0 canvas.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            owners: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of member displays.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Places `display` with its top-left corner at `(x_offset, y_offset)`.
    ///
    /// Grows the canvas to cover the new placement and hands the placement's
    /// whole rectangle to the new member, overriding earlier members where
    /// they overlap.  Returns the member's index.
    pub fn add(&mut self, display: D, x_offset: u32, y_offset: u32) -> usize {
        let placement = Placement {
            display,
            x_offset,
            y_offset,
        };
        let member = self.members.len();

        self.grow_to(
            self.width.max(placement.right()),
            self.height.max(placement.bottom()),
        );

        let width = self.width as usize;
        for y in placement.y_offset..placement.bottom() {
            let row = y as usize * width;
            for x in placement.x_offset..placement.right() {
                self.owners[row + x as usize] = Some(member);
            }
        }

        debug!(
            member,
            x_offset,
            y_offset,
            width = self.width,
            height = self.height,
            "display added to canvas"
        );
        self.members.push(placement);
        member
    }

    /// Returns the member owning `(x, y)`, or `None` if uncovered.
    pub fn owner_of(&self, x: i32, y: i32) -> Option<Owner> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let member = self.owners[y as usize * self.width as usize + x as usize]?;
        let placement = &self.members[member];
        Some(Owner {
            member,
            local_x: x - placement.x_offset as i32,
            local_y: y - placement.y_offset as i32,
        })
    }

    /// Sets `(x, y)` on the owning member; uncovered coordinates are a no-op.
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if let Some(owner) = self.owner_of(x, y) {
            self.members[owner.member]
                .display
                .set(owner.local_x, owner.local_y, color);
        }
    }

    /// Reads `(x, y)` from the owning member.
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        let owner = self.owner_of(x, y)?;
        self.members[owner.member]
            .display
            .get(owner.local_x, owner.local_y)
    }

    /// Sets every covered coordinate to `color`.
    pub fn fill(&mut self, color: Color) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.set(x, y, color);
            }
        }
    }

    /// Clears every member once.
    pub fn clear(&mut self) {
        for placement in &mut self.members {
            placement.display.clear();
        }
    }

    /// Sends every member once, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`CanvasSendError`] listing every member that failed.  All
    /// members are attempted regardless of earlier failures.
    pub fn send(&mut self) -> Result<(), CanvasSendError> {
        let mut failures = Vec::new();
        for (member, placement) in self.members.iter_mut().enumerate() {
            if let Err(error) = placement.display.send() {
                warn!(member, "display send failed: {error}");
                failures.push(MemberFailure { member, error });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CanvasSendError {
                attempted: self.members.len(),
                failures,
            })
        }
    }

    /// All placements in insertion order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement<D>> {
        self.members.iter()
    }

    /// All member displays in insertion order.
    pub fn displays(&self) -> impl Iterator<Item = &D> {
        self.members.iter().map(|p| &p.display)
    }

    pub fn display(&self, member: usize) -> Option<&D> {
        self.members.get(member).map(|p| &p.display)
    }

    pub fn display_mut(&mut self, member: usize) -> Option<&mut D> {
        self.members.get_mut(member).map(|p| &mut p.display)
    }

    /// Consumes the canvas and returns the member displays.
    pub fn into_displays(self) -> Vec<D> {
        self.members.into_iter().map(|p| p.display).collect()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Resizes the ownership index, keeping existing entries in place.
    fn grow_to(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut owners = vec![None; width as usize * height as usize];
        let old_width = self.width as usize;
        for y in 0..self.height as usize {
            let src = &self.owners[y * old_width..(y + 1) * old_width];
            let dst_start = y * width as usize;
            owners[dst_start..dst_start + old_width].copy_from_slice(src);
        }
        self.owners = owners;
        self.width = width;
        self.height = height;
    }
}

impl<D: Display> Default for UnifiedCanvas<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Display> Display for UnifiedCanvas<D> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        UnifiedCanvas::set(self, x, y, color)
    }

    fn get(&self, x: i32, y: i32) -> Option<Color> {
        UnifiedCanvas::get(self, x, y)
    }

    fn clear(&mut self) {
        UnifiedCanvas::clear(self)
    }

    fn send(&mut self) -> Result<(), DisplayError> {
        UnifiedCanvas::send(self).map_err(DisplayError::from)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
