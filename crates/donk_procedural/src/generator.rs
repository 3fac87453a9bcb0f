//! # Tube Generator
//!
//! Deterministic ring source for one run.
//!
//! ## Design
//!
//! The generator owns the run's random stream, the level planner and the
//! ring builder. Each [`TubeGenerator::pull`] asks the planner for a draft
//! and places it one ring spacing past the given parent. Two generators
//! with equal configuration and catalog produce identical ring sequences.
//!
//! Padding rings for backfilling behind the player never touch the random
//! stream, so rewinding does not change what is generated ahead.

use std::collections::BTreeSet;
use std::sync::Arc;

use donk_core::SeededRng;
use tracing::{debug, info};

use crate::builder::{Placement, RingBuilder, RingDraft};
use crate::catalog::TileCatalog;
use crate::config::TubeConfig;
use crate::error::TubeResult;
use crate::nav::{Level, NavType, TileWidth};
use crate::planner::{LevelScript, PlanContext, Planner};
use crate::ring::{Branch, BranchId, Ring};

/// A freshly generated ring.
#[derive(Clone, Debug)]
pub struct Generated {
    /// The ring, unlinked.
    pub ring: Ring,
    /// Set when the ring is the first of a new branch.
    pub new_branch: Option<Branch>,
}

/// Produces rings for one run.
pub struct TubeGenerator {
    catalog: Arc<TileCatalog>,
    config: TubeConfig,
    builder: RingBuilder,
    planner: Planner,
    rng: SeededRng,
    serial: u64,
    branch: BranchId,
    last_position: Option<f32>,
}

impl TubeGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `config` - Tube configuration, validated here
    /// * `catalog` - Tile catalog, shared
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TubeConfig, catalog: Arc<TileCatalog>) -> TubeResult<Self> {
        config.validate()?;
        let level = config.level()?;

        info!(
            seed = config.seed,
            level = %level,
            initial_segments = config.initial_segments,
            "Tube generator created"
        );

        Ok(Self {
            builder: RingBuilder::new(&config),
            planner: Planner::new(LevelScript::for_run(level), level, config.initial_segments),
            rng: SeededRng::new(config.run_seed()),
            catalog,
            config,
            serial: 0,
            branch: BranchId::TRUNK,
            last_position: None,
        })
    }

    /// Generates the next ring, placed after a parent centered at
    /// `parent_position`, or at 0 when there is no parent.
    pub fn pull(&mut self, parent_position: Option<f32>) -> Generated {
        let planned = {
            let mut cx = PlanContext {
                rng: &mut self.rng,
                catalog: &self.catalog,
                config: &self.config,
            };
            self.planner.next_ring(&mut cx)
        };

        let mut draft = planned.draft;
        let new_branch = draft.opens_branch.take().map(|instances| {
            self.branch = self.branch.next();
            info!(
                branch = self.branch.0,
                instances = instances.len(),
                serial = self.serial,
                "Branch opened"
            );
            Branch {
                id: self.branch,
                instances,
            }
        });

        let ring = self.builder.build(
            draft,
            Placement {
                serial: self.serial,
                level: planned.level,
                branch: self.branch,
                incoming_segments: planned.incoming_segments,
                parent_position,
                override_gravity: planned.gravity,
                play_tracks: planned.play_tracks,
            },
        );
        self.serial += 1;
        self.last_position = Some(ring.position);

        Generated { ring, new_branch }
    }

    /// Generates `n` rings, each placed after the previous one.
    pub fn generate_next(&mut self, n: usize) -> Vec<Ring> {
        (0..n).map(|_| self.pull(self.last_position).ring).collect()
    }

    /// A flat ring of empty tiles placed one spacing before `template`.
    ///
    /// Its radius and level match the template's near edge so it joins the
    /// chain seamlessly. Draws no randomness.
    pub fn padding_ring(&mut self, template: &Ring) -> Ring {
        let level = template.level;
        let count = template.incoming_segments.max(1) as usize;
        let slots = (0..count)
            .map(|i| self.catalog.pick_nth(level, TileWidth::One, NavType::Empty, i))
            .collect();
        let draft = RingDraft::new(slots, TileWidth::One).with_uniform_exits(2, 2);

        let mut ring = self.builder.build(
            draft,
            Placement {
                serial: self.serial,
                level,
                branch: template.branch,
                incoming_segments: template.incoming_segments,
                parent_position: Some(template.position - 2.0 * self.builder.ring_spacing()),
                override_gravity: None,
                play_tracks: BTreeSet::new(),
            },
        );
        ring.start_depth = template.start_depth;
        ring.end_depth = template.start_depth;
        self.serial += 1;

        debug!(serial = ring.serial, position = ring.position, "Padding ring built");
        ring
    }

    /// Rings generated so far, padding included.
    #[inline]
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Branch new rings are assigned to.
    #[inline]
    #[must_use]
    pub fn branch(&self) -> BranchId {
        self.branch
    }

    /// Level the planner is on.
    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.planner.level()
    }

    /// The configuration the generator runs with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    /// The shared tile catalog.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<TileCatalog> {
        &self.catalog
    }
}

impl std::fmt::Debug for TubeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TubeGenerator")
            .field("serial", &self.serial)
            .field("branch", &self.branch)
            .field("level", &self.planner.level())
            .field("segments", &self.planner.segments())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::SegmentLibrary;

    fn generator(seed: u64) -> TubeGenerator {
        let config = TubeConfig {
            seed,
            ..TubeConfig::test()
        };
        let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
        TubeGenerator::new(config, catalog).unwrap()
    }

    fn fingerprint(rings: &[Ring]) -> Vec<(u32, Vec<NavType>, Vec<String>)> {
        rings
            .iter()
            .map(|r| {
                (
                    r.segment_count(),
                    r.nav_types().collect(),
                    r.slots.iter().map(|s| s.prototype.name.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_tube() {
        let a = generator(7).generate_next(60);
        let b = generator(7).generate_next(60);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_different_seed_different_tube() {
        let a = generator(7).generate_next(60);
        let b = generator(8).generate_next(60);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_positions_and_radii_chain() {
        let mut gen = generator(2);
        let rings = gen.generate_next(40);
        assert_eq!(rings[0].position, 0.0);
        for pair in rings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!((b.position - a.position - gen.config().ring_spacing).abs() < 1e-3);
            assert!((b.start_radius - gen.builder.radius_for(b.incoming_segments)).abs() < 1e-6);
            assert_eq!(b.serial, a.serial + 1);
        }
        // Only the flesh script's explicit resets break the carried count
        let resets = rings.windows(2).filter(|p| p[1].incoming_segments != p[0].segment_count()).count();
        assert!(resets <= 3, "{resets} segment resets in 40 rings");
        assert_eq!(gen.serial(), 40);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TubeConfig {
            look_ahead: 0,
            ..TubeConfig::test()
        };
        let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
        assert!(TubeGenerator::new(config, catalog).is_err());
    }

    #[test]
    fn test_padding_ring_draws_no_randomness() {
        let mut a = generator(3);
        let mut b = generator(3);
        let first = a.pull(None).ring;
        b.pull(None);

        let pad = a.padding_ring(&first);
        assert!((pad.position - (first.position - a.config().ring_spacing)).abs() < 1e-4);
        assert!((pad.end_radius - first.start_radius).abs() < 1e-5);
        assert_eq!(pad.level, first.level);
        assert!(pad.exits.iter().all(|e| e.left == 2 && e.right == 2));

        let next_a = a.pull(Some(first.position)).ring;
        let next_b = b.pull(Some(first.position)).ring;
        assert_eq!(fingerprint(&[next_a]), fingerprint(&[next_b]));
    }

    #[test]
    fn test_flesh_run_opens_branch() {
        let config = TubeConfig {
            start_level: "flesh".into(),
            ..TubeConfig::test()
        };
        let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
        let mut gen = TubeGenerator::new(config, catalog).unwrap();

        let mut opened = None;
        for _ in 0..80 {
            let generated = gen.pull(None);
            if let Some(branch) = generated.new_branch {
                assert_eq!(generated.ring.branch, branch.id);
                opened = Some(branch);
                break;
            }
        }
        let branch = opened.expect("flesh opens a branch at its transition");
        assert_eq!(branch.id, BranchId(1));
        assert!(!branch.instances.is_empty());
        assert_eq!(gen.branch(), BranchId(1));
    }
}
