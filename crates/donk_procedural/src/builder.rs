//! # Ring Builder
//!
//! Turns a planned set of slot tiles into a placed [`Ring`]: radii from the
//! segment counts on either side, slot offsets around the circumference,
//! and a position one ring spacing past the parent.

use std::collections::BTreeSet;

use donk_core::Vec2;

use crate::catalog::Pick;
use crate::config::TubeConfig;
use crate::nav::{Level, TileWidth};
use crate::ring::{BranchId, Ring, RingSlot};
use crate::solver::Exit;

/// Contents of a ring before it is placed in the tube.
#[derive(Clone, Debug)]
pub struct RingDraft {
    /// One tile per slot.
    pub slots: Vec<Pick>,
    /// Width class of every slot.
    pub width: TileWidth,
    /// Navigable slots at the far edge.
    pub exits: Vec<Exit>,
    /// Depth at the near edge.
    pub start_depth: f32,
    /// Depth at the far edge.
    pub end_depth: f32,
    /// Replaces the radius derived from the segment count at the far edge.
    pub end_radius: Option<f32>,
    /// Set when this ring opens a new branch: centers of its visual copies.
    pub opens_branch: Option<Vec<Vec2>>,
}

impl RingDraft {
    /// A flat ring with no exits.
    #[must_use]
    pub fn new(slots: Vec<Pick>, width: TileWidth) -> Self {
        Self {
            slots,
            width,
            exits: Vec::new(),
            start_depth: 0.0,
            end_depth: 0.0,
            end_radius: None,
            opens_branch: None,
        }
    }

    /// Sets the exits.
    #[must_use]
    pub fn with_exits(mut self, exits: Vec<Exit>) -> Self {
        self.exits = exits;
        self
    }

    /// Every slot is an exit with the same swerve budgets.
    #[must_use]
    pub fn with_uniform_exits(self, left: u8, right: u8) -> Self {
        let exits = (0..self.slots.len()).map(|i| Exit::new(i, left, right)).collect();
        self.with_exits(exits)
    }

    /// Sets near and far depth.
    #[must_use]
    pub fn with_depths(mut self, start: f32, end: f32) -> Self {
        self.start_depth = start;
        self.end_depth = end;
        self
    }

    /// Angular resolution in 1-wide segment units.
    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> u32 {
        self.slots.len() as u32 * self.width.units()
    }
}

/// Where and in what context a ring is placed.
#[derive(Clone, Debug)]
pub struct Placement {
    /// Generation serial.
    pub serial: u64,
    /// Level tag.
    pub level: Level,
    /// Branch the ring belongs to.
    pub branch: BranchId,
    /// Segment count of the ring before, which sets the near radius.
    pub incoming_segments: u32,
    /// Center of the parent ring, or None for the first ring of a chain.
    pub parent_position: Option<f32>,
    /// Gravity override.
    pub override_gravity: Option<f32>,
    /// Music cues.
    pub play_tracks: BTreeSet<String>,
}

/// Builds rings with fixed tube geometry.
#[derive(Clone, Copy, Debug)]
pub struct RingBuilder {
    ar_factor: f32,
    x_spacing: f32,
    ring_spacing: f32,
}

impl RingBuilder {
    /// Creates a builder from the tube's geometry settings.
    #[must_use]
    pub fn new(config: &TubeConfig) -> Self {
        Self {
            ar_factor: config.ar_factor,
            x_spacing: config.x_spacing,
            ring_spacing: config.ring_spacing,
        }
    }

    /// Tube radius for a segment count.
    #[inline]
    #[must_use]
    pub fn radius_for(&self, segments: u32) -> f32 {
        segments as f32 / self.ar_factor
    }

    /// Distance between ring centers.
    #[inline]
    #[must_use]
    pub fn ring_spacing(&self) -> f32 {
        self.ring_spacing
    }

    /// Places a drafted ring.
    ///
    /// The near radius continues from the previous ring's segment count, the
    /// far radius matches this ring's own. The first ring of a chain is
    /// centered at 0.
    #[must_use]
    pub fn build(&self, draft: RingDraft, placement: Placement) -> Ring {
        let segments = draft.segment_count();
        let slot_pitch = self.x_spacing * draft.width.units() as f32;

        let slots = draft
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, pick)| RingSlot {
                prototype: pick.prototype,
                nav: pick.nav,
                x: i as f32 * slot_pitch,
            })
            .collect();

        Ring {
            serial: placement.serial,
            level: placement.level,
            branch: placement.branch,
            width: draft.width,
            incoming_segments: placement.incoming_segments,
            start_radius: self.radius_for(placement.incoming_segments),
            end_radius: draft.end_radius.unwrap_or_else(|| self.radius_for(segments)),
            start_depth: draft.start_depth,
            end_depth: draft.end_depth,
            position: placement.parent_position.map_or(0.0, |p| p + self.ring_spacing),
            span: self.ring_spacing,
            x_spacing: self.x_spacing,
            slots,
            exits: draft.exits,
            override_gravity: placement.override_gravity,
            play_tracks: placement.play_tracks,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TileCatalog;
    use crate::library::SegmentLibrary;
    use crate::nav::NavType;

    fn placement(incoming: u32, parent: Option<f32>) -> Placement {
        Placement {
            serial: 1,
            level: Level::Steel,
            branch: BranchId::TRUNK,
            incoming_segments: incoming,
            parent_position: parent,
            override_gravity: None,
            play_tracks: BTreeSet::new(),
        }
    }

    #[test]
    fn test_build_geometry() {
        let catalog = TileCatalog::build(&SegmentLibrary::standard());
        let config = TubeConfig::default();
        let builder = RingBuilder::new(&config);

        let picks = (0..4)
            .map(|i| catalog.pick_nth(Level::Steel, TileWidth::Three, NavType::Passable, i))
            .collect();
        let ring = builder.build(
            RingDraft::new(picks, TileWidth::Three).with_uniform_exits(1, 1),
            placement(20, Some(100.0)),
        );

        assert_eq!(ring.slot_count(), 4);
        assert_eq!(ring.segment_count(), 12);
        assert!((ring.start_radius - 20.0 / config.ar_factor).abs() < 1e-6);
        assert!((ring.end_radius - 12.0 / config.ar_factor).abs() < 1e-6);
        assert!((ring.position - 140.0).abs() < 1e-6);
        assert!((ring.slots[2].x - 12.0).abs() < 1e-6);
        assert_eq!(ring.exits.len(), 4);
    }

    #[test]
    fn test_first_ring_and_radius_override() {
        let catalog = TileCatalog::build(&SegmentLibrary::standard());
        let builder = RingBuilder::new(&TubeConfig::default());

        let mut draft = RingDraft::new(
            vec![catalog.pick_nth(Level::Flesh, TileWidth::One, NavType::Empty, 0)],
            TileWidth::One,
        )
        .with_depths(0.0, 2.5);
        draft.end_radius = Some(1.0);

        let ring = builder.build(draft, placement(3, None));
        assert_eq!(ring.position, 0.0);
        assert_eq!(ring.end_radius, 1.0);
        assert_eq!(ring.end_depth, 2.5);
    }
}
