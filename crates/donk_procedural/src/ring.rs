//! # Rings
//!
//! One cross-sectional slice of the tube: a circle of slots, each showing a
//! segment prototype, spanning one ring spacing along the travel axis.
//!
//! ## Coordinates
//!
//! `position` is the ring's center on the travel axis, relative to the
//! player (who sits at 0). The ring spans `position ± span / 2`. Radius and
//! depth are interpolated linearly across that span and are *not* clamped
//! outside it, so callers can extrapolate for look-ahead sampling.

use std::collections::BTreeSet;
use std::sync::Arc;

use donk_core::{PoolHandle, Vec2};

use crate::catalog::SegmentPrototype;
use crate::library::RawPolygon;
use crate::nav::{Level, NavType, TileWidth};
use crate::solver::Exit;

/// Identity of a geometric branch of the tube.
///
/// The trunk is branch 0; every transition starts the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub u32);

impl BranchId {
    /// The trunk.
    pub const TRUNK: Self = Self(0);

    /// The branch a transition out of this one creates.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A branch created by a transition.
///
/// The new tube is drawn once per open slot of the transition ring; each
/// instance is centered at an offset from the old tube's axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    /// Identity.
    pub id: BranchId,
    /// Cross-section centers of the visual copies.
    pub instances: Vec<Vec2>,
}

/// One slot of a ring.
#[derive(Clone, Debug)]
pub struct RingSlot {
    /// The tile shown in this slot.
    pub prototype: Arc<SegmentPrototype>,
    /// What the slot lets the ship do.
    pub nav: NavType,
    /// Offset around the unrolled circumference.
    pub x: f32,
}

/// A generated ring.
#[derive(Clone, Debug)]
pub struct Ring {
    /// Generation order, unique within a run.
    pub serial: u64,
    /// Level the ring belongs to.
    pub level: Level,
    /// Branch the ring belongs to.
    pub branch: BranchId,
    /// Width class of the ring's slots.
    pub width: TileWidth,
    /// Segment count of the ring before this one.
    pub incoming_segments: u32,
    /// Radius at the near edge.
    pub start_radius: f32,
    /// Radius at the far edge.
    pub end_radius: f32,
    /// Depth at the near edge.
    pub start_depth: f32,
    /// Depth at the far edge.
    pub end_depth: f32,
    /// Center on the travel axis, relative to the player.
    pub position: f32,
    /// Length along the travel axis.
    pub span: f32,
    /// Distance between 1-wide segments around the circumference.
    pub x_spacing: f32,
    /// Slots in angular order.
    pub slots: Vec<RingSlot>,
    /// Navigable slots at the far edge.
    pub exits: Vec<Exit>,
    /// Gravity override for physics collaborators.
    pub override_gravity: Option<f32>,
    /// Music cues to start when this ring is reached.
    pub play_tracks: BTreeSet<String>,
    /// The following ring, set by the owner of the chain.
    pub next: Option<PoolHandle>,
}

impl Ring {
    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Angular resolution in 1-wide segment units.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> u32 {
        self.slots.len() as u32 * self.width.units()
    }

    /// Navigation type of every slot.
    pub fn nav_types(&self) -> impl ExactSizeIterator<Item = NavType> + '_ {
        self.slots.iter().map(|s| s.nav)
    }

    /// Local progress through the ring at an axis position: 0 at the near
    /// edge, 1 at the far edge. Unclamped.
    #[inline]
    #[must_use]
    pub fn progress_at(&self, axis_pos: f32) -> f32 {
        (axis_pos - self.position) / self.span + 0.5
    }

    /// Tube radius at an axis position.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// // start 10, end 16, centered at 100, span 40
    /// assert_eq!(ring.radius_at(80.0), 10.0);
    /// assert_eq!(ring.radius_at(120.0), 16.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn radius_at(&self, axis_pos: f32) -> f32 {
        let t = self.progress_at(axis_pos);
        self.end_radius * t + self.start_radius * (1.0 - t)
    }

    /// Trench depth at an axis position.
    #[inline]
    #[must_use]
    pub fn depth_at(&self, axis_pos: f32) -> f32 {
        let t = self.progress_at(axis_pos);
        self.end_depth * t + self.start_depth * (1.0 - t)
    }

    /// Whether the ring is far enough behind the player to be freed.
    #[inline]
    #[must_use]
    pub fn needs_cull(&self, cull_offset: f32) -> bool {
        self.position < -cull_offset
    }

    /// Whether the ring's span contains an axis position.
    #[inline]
    #[must_use]
    pub fn contains(&self, axis_pos: f32) -> bool {
        (0.0..=1.0).contains(&self.progress_at(axis_pos))
    }

    /// Length of the unrolled circumference.
    #[inline]
    #[must_use]
    pub fn circumference(&self) -> f32 {
        self.segment_count() as f32 * self.x_spacing
    }

    /// The pair of slots under a fractional angle (0..1 around the ring).
    ///
    /// Returns the slots at the floor and ceiling of the scaled angle; they
    /// are equal when the angle lands exactly on a slot.
    #[must_use]
    pub fn slot_at(&self, angle_fraction: f32) -> (usize, usize) {
        let n = self.slot_count().max(1);
        let scaled = angle_fraction.rem_euclid(1.0) * n as f32;
        let i0 = scaled.floor() as usize % n;
        let i1 = scaled.ceil() as usize % n;
        (i0, i1)
    }

    /// Collision shapes of a slot. Wraps around.
    #[must_use]
    pub fn collision_shapes(&self, slot: usize) -> &[RawPolygon] {
        if self.slots.is_empty() {
            return &[];
        }
        &self.slots[slot % self.slots.len()].prototype.collision
    }

    /// Moves the ring along the travel axis.
    #[inline]
    pub fn shift(&mut self, delta: f32) {
        self.position += delta;
    }
}
