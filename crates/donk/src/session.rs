//! # Run Session
//!
//! Drives one run: splits each frame into sub-steps, advances the tube and
//! hands every collaborator a fresh view of it.
//!
//! ## Design
//!
//! Collaborators (collision, physics, music) get a [`TubeView`] per
//! sub-step and must not keep ring references past it: rings behind the
//! player are freed on the next advance.

use donk_procedural::{Ring, TubeManager, TubeStats};
use tracing::info;

use crate::config::DonkConfig;
use crate::error::DonkResult;
use crate::probe::ShipProbe;
use crate::step::FixedStep;

/// Read-only view of the tube for one sub-step.
pub struct TubeView<'a> {
    tube: &'a TubeManager,
}

impl<'a> TubeView<'a> {
    /// Wraps a tube.
    #[must_use]
    pub fn new(tube: &'a TubeManager) -> Self {
        Self { tube }
    }

    /// The ring under the player.
    #[must_use]
    pub fn current_ring(&self) -> &'a Ring {
        self.tube.current_ring()
    }

    /// The ring after it.
    #[must_use]
    pub fn next_ring(&self) -> Option<&'a Ring> {
        self.tube.peek_next()
    }

    /// The oldest live ring.
    #[must_use]
    pub fn first_ring(&self) -> &'a Ring {
        self.tube.first_ring()
    }

    /// Distance travelled.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.tube.y()
    }
}

/// Something that reacts to the tube every sub-step.
pub trait TubeCollaborator {
    /// Called once per sub-step, after the tube has advanced.
    fn on_step(&mut self, view: &TubeView<'_>, dt: f32);
}

/// One run of the game core.
pub struct RunSession {
    tube: TubeManager,
    stepper: FixedStep,
    probe: ShipProbe,
    collaborators: Vec<Box<dyn TubeCollaborator>>,
    boost: bool,
    steps: u64,
    rewinds: u32,
}

impl RunSession {
    /// Starts a run over the built-in segment library.
    ///
    /// # Errors
    ///
    /// Returns an error if either half of the config is invalid.
    pub fn new(config: DonkConfig) -> DonkResult<Self> {
        config.step.validate()?;
        let tube = TubeManager::with_standard_library(config.tube)?;
        Ok(Self::with_tube(tube, FixedStep::new(config.step)))
    }

    /// Starts a run on an existing tube.
    #[must_use]
    pub fn with_tube(tube: TubeManager, stepper: FixedStep) -> Self {
        Self {
            tube,
            stepper,
            probe: ShipProbe::new(0.0),
            collaborators: Vec::new(),
            boost: false,
            steps: 0,
            rewinds: 0,
        }
    }

    /// Adds a collaborator. Collaborators run in the order added, after the
    /// ship probe.
    pub fn add_collaborator(&mut self, collaborator: Box<dyn TubeCollaborator>) {
        self.collaborators.push(collaborator);
    }

    /// Runs one frame.
    ///
    /// # Returns
    ///
    /// The number of sub-steps run; 0 while paused.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        if self.tube.is_paused() {
            return 0;
        }

        let substeps = self.stepper.substeps(frame_dt, self.boost);
        for _ in 0..substeps.count {
            self.tube.advance(self.stepper.distance(substeps.dt));
            // Collision looks one ring ahead
            self.tube.next_ring();

            let view = TubeView::new(&self.tube);
            self.probe.on_step(&view, substeps.dt);
            for collaborator in &mut self.collaborators {
                collaborator.on_step(&view, substeps.dt);
            }
            self.steps += 1;
        }
        substeps.count
    }

    /// Freezes the run.
    pub fn pause(&mut self) {
        self.tube.pause();
    }

    /// Unfreezes the run.
    pub fn resume(&mut self) {
        self.tube.resume();
    }

    /// Flips between paused and running.
    pub fn toggle_pause(&mut self) {
        if self.tube.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Puts the player `distance` back after a crash.
    pub fn rewind(&mut self, distance: f32) {
        let y = self.tube.y() - distance;
        self.tube.set_y(y);
        self.rewinds += 1;
        info!(distance, y, rewinds = self.rewinds, "Rewound after crash");
    }

    /// Turns boost on or off.
    pub fn set_boost(&mut self, boost: bool) {
        self.boost = boost;
    }

    /// Whether boosting.
    #[inline]
    #[must_use]
    pub fn is_boosting(&self) -> bool {
        self.boost
    }

    /// Whether paused.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.tube.is_paused()
    }

    /// The tube.
    #[inline]
    #[must_use]
    pub fn tube(&self) -> &TubeManager {
        &self.tube
    }

    /// The ship probe.
    #[inline]
    #[must_use]
    pub fn probe(&self) -> &ShipProbe {
        &self.probe
    }

    /// The ship probe, mutably, for steering and draining cues.
    #[inline]
    pub fn probe_mut(&mut self) -> &mut ShipProbe {
        &mut self.probe
    }

    /// Sub-steps run so far.
    #[inline]
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Rewinds so far.
    #[inline]
    #[must_use]
    pub fn rewinds(&self) -> u32 {
        self.rewinds
    }

    /// Tube counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> TubeStats {
        self.tube.stats()
    }
}
