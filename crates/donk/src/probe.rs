//! # Ship Probe
//!
//! Samples the tube at the ship's angle every sub-step: which slots are
//! under the ship in the current and next ring, where their collision
//! shapes sit relative to the ship, how far below the floor is, and which
//! music cues and gravity override apply.

use donk_procedural::{Level, NavType, Ring};
use tracing::debug;

use crate::session::{TubeCollaborator, TubeView};

/// The slots under the ship in one ring.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSample {
    /// Ring serial.
    pub serial: u64,
    /// Slot indices at the floor and ceiling of the ship angle.
    pub slots: (usize, usize),
    /// Navigation types of those slots.
    pub navs: (NavType, NavType),
    /// Offset of each slot from the ship around the circumference, in
    /// `[-circumference / 2, circumference / 2]`.
    pub offsets: (f32, f32),
    /// Collision shapes to test, without duplicates.
    pub shapes: usize,
}

impl SlotSample {
    fn of(ring: &Ring, angle: f32) -> Self {
        let (i0, i1) = ring.slot_at(angle);
        let n = ring.slot_count().max(1) as f32;
        let c = ring.circumference();
        let offset = |i: usize| {
            let x = (i as f32 / n - angle).rem_euclid(1.0) * c;
            if x > c / 2.0 {
                x - c
            } else {
                x
            }
        };
        let shapes = ring.collision_shapes(i0).len() + if i0 == i1 { 0 } else { ring.collision_shapes(i1).len() };
        Self {
            serial: ring.serial,
            slots: (i0, i1),
            navs: (ring.slots[i0].nav, ring.slots[i1].nav),
            offsets: (offset(i0), offset(i1)),
            shapes,
        }
    }

    /// Whether either slot lets the ship fly straight on.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.navs.0.is_passable() || self.navs.1.is_passable()
    }
}

/// Everything sampled on the latest sub-step.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeSample {
    /// Level of the current ring.
    pub level: Level,
    /// Distance from the tube axis to the floor under the ship.
    pub ground_radius: f32,
    /// Gravity override of the current ring.
    pub gravity: Option<f32>,
    /// Slots in the current ring.
    pub current: SlotSample,
    /// Slots in the next ring, if generated.
    pub next: Option<SlotSample>,
}

/// Samples the tube at a fixed ship angle.
#[derive(Clone, Debug, Default)]
pub struct ShipProbe {
    angle: f32,
    sample: Option<ProbeSample>,
    last_serial: Option<u64>,
    cues: Vec<String>,
}

impl ShipProbe {
    /// Creates a probe at an angle, as a fraction of a full turn.
    #[must_use]
    pub fn new(angle: f32) -> Self {
        Self {
            angle: angle.rem_euclid(1.0),
            ..Self::default()
        }
    }

    /// Rolls the ship.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle.rem_euclid(1.0);
    }

    /// Ship angle, as a fraction of a full turn.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// The latest sample, if any sub-step has run.
    #[inline]
    #[must_use]
    pub fn sample(&self) -> Option<&ProbeSample> {
        self.sample.as_ref()
    }

    /// Music cues reached since the last call.
    pub fn take_cues(&mut self) -> Vec<String> {
        std::mem::take(&mut self.cues)
    }
}

impl TubeCollaborator for ShipProbe {
    fn on_step(&mut self, view: &TubeView<'_>, _dt: f32) {
        let ring = view.current_ring();

        if self.last_serial != Some(ring.serial) {
            self.last_serial = Some(ring.serial);
            if !ring.play_tracks.is_empty() {
                debug!(serial = ring.serial, tracks = ?ring.play_tracks, "Music cue reached");
                self.cues.extend(ring.play_tracks.iter().cloned());
            }
        }

        self.sample = Some(ProbeSample {
            level: ring.level,
            ground_radius: ring.radius_at(0.0) - ring.depth_at(0.0),
            gravity: ring.override_gravity,
            current: SlotSample::of(ring, self.angle),
            next: view.next_ring().map(|next| SlotSample::of(next, self.angle)),
        });
    }
}
