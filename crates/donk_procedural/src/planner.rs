//! # Section Planners
//!
//! Level scripts and the state machine that plays them one ring at a time.
//!
//! ## Design
//!
//! A level is an ordered list of [`Step`]s. Single-ring steps emit their
//! ring directly; multi-ring steps (tile sections, trenches, walls, obstacle
//! runs, transitions) park a [`Section`] that remembers where it is between
//! pulls. The script loops forever from its loop point.
//!
//! The segment count travels explicitly: every section reads the count the
//! previous ring ended with, and the ring it drafts carries its own count
//! out. Nothing else writes it except the `SetSegments` step.

use std::collections::BTreeSet;
use std::f32::consts::TAU;
use std::sync::Arc;

use donk_core::{SeededRng, Vec2};
use tracing::{debug, warn};

use crate::builder::RingDraft;
use crate::catalog::{Bucket, Pick, TileCatalog};
use crate::config::TubeConfig;
use crate::nav::{Level, NavType, TileWidth};
use crate::solver::{self, Exit, SolveFlags};

/// Segment count an empty ring aims for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentTarget {
    /// Relative to the incoming count.
    Delta(i32),
    /// An exact count.
    Absolute(u32),
}

/// One instruction of a level script.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Overrides the incoming segment count.
    SetSegments(u32),
    /// Switches the level tag and tile set.
    SetLevel(Level),
    /// Queues a music cue on the next ring.
    Cue(&'static str),
    /// Sets or clears the gravity override of following rings.
    SetGravity(Option<f32>),
    /// One ring of empty tiles.
    Empty {
        /// Segment count to aim for.
        target: SegmentTarget,
        /// Tiles from another level.
        tiles: Option<Level>,
        /// Far-edge radius override.
        end_radius: Option<f32>,
    },
    /// One ring of passable tiles.
    Passable {
        /// Change in segment count.
        delta: i32,
    },
    /// A run of solved tile rings; width picked at random when None.
    TileSection(Option<TileWidth>),
    /// Trench: entrance, constant-depth middle, optional end.
    Trench,
    /// A run of width-1 rings with plain gaps only.
    Wall,
    /// Rings built from obstacle tiles, one per multiplier.
    Obstacle(&'static [u32]),
    /// Changes the segment count to anything and starts a new branch.
    Transition {
        /// Segment count of the new branch.
        to: u32,
    },
}

impl Step {
    const fn empty() -> Self {
        Self::Empty {
            target: SegmentTarget::Delta(0),
            tiles: None,
            end_radius: None,
        }
    }

    const fn empty_delta(delta: i32) -> Self {
        Self::Empty {
            target: SegmentTarget::Delta(delta),
            tiles: None,
            end_radius: None,
        }
    }
}

/// An ordered step list that loops from `loop_start` once it runs out.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelScript {
    steps: Vec<Step>,
    loop_start: usize,
}

impl LevelScript {
    /// Creates a script.
    ///
    /// An empty step list becomes a single empty ring repeated forever; a
    /// loop point past the end loops the last step.
    #[must_use]
    pub fn new(mut steps: Vec<Step>, loop_start: usize) -> Self {
        if steps.is_empty() {
            steps.push(Step::empty());
        }
        let loop_start = loop_start.min(steps.len() - 1);
        Self { steps, loop_start }
    }

    /// The script for a run starting at `level`: that level and every one
    /// after it.
    #[must_use]
    pub fn for_run(level: Level) -> Self {
        let mut steps = Vec::new();
        if level == Level::Steel {
            steps.extend(steel());
        }
        if level != Level::Flesh {
            steps.extend(rift());
        }
        let (flesh, flesh_loop) = flesh();
        let loop_start = steps.len() + flesh_loop;
        steps.extend(flesh);
        Self::new(steps, loop_start)
    }

    /// Steps in order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn step(&self, cursor: usize) -> &Step {
        &self.steps[cursor]
    }

    fn advance(&self, cursor: usize) -> usize {
        if cursor + 1 < self.steps.len() {
            cursor + 1
        } else {
            self.loop_start
        }
    }
}

fn steel() -> Vec<Step> {
    vec![
        Step::SetLevel(Level::Steel),
        Step::Cue("steel"),
        Step::SetSegments(2),
        Step::empty_delta(18),
        Step::empty_delta(10),
        Step::TileSection(Some(TileWidth::Three)),
        Step::Trench,
        Step::Passable { delta: 30 },
        Step::empty_delta(60),
        Step::Passable { delta: 30 },
        Step::TileSection(Some(TileWidth::Three)),
        Step::TileSection(Some(TileWidth::One)),
        Step::Trench,
    ]
}

fn rift() -> Vec<Step> {
    vec![
        Step::SetLevel(Level::Rift),
        Step::Cue("rift"),
        Step::empty(),
        Step::Wall,
        Step::empty(),
    ]
}

/// The flesh level and the index its endless loop starts at.
fn flesh() -> (Vec<Step>, usize) {
    const MOUTH: &[u32] = &[100, 40, 15, 6, 3];

    let mut steps = vec![
        Step::SetSegments(6),
        Step::Empty {
            target: SegmentTarget::Delta(0),
            tiles: Some(Level::Rift),
            end_radius: None,
        },
        Step::SetLevel(Level::Flesh),
        Step::Cue("flesh"),
        Step::SetSegments(200),
        Step::Obstacle(MOUTH),
        // Stomach: the tube pinches shut and the ship floats through
        Step::SetGravity(Some(0.5)),
        Step::Empty {
            target: SegmentTarget::Absolute(3),
            tiles: None,
            end_radius: Some(1.0),
        },
        Step::SetGravity(None),
        Step::SetSegments(40),
        Step::empty(),
        Step::Passable { delta: 0 },
        Step::TileSection(None),
        Step::TileSection(None),
        Step::Passable { delta: -3 },
        Step::Transition { to: 6 },
    ];
    for delta in [3, 3, -3] {
        steps.push(Step::TileSection(None));
        steps.push(Step::TileSection(None));
        steps.push(Step::Passable { delta });
    }

    let loop_start = steps.len();
    steps.extend([
        Step::empty(),
        Step::TileSection(None),
        Step::empty(),
        Step::Trench,
        Step::empty(),
    ]);
    (steps, loop_start)
}

/// Shared inputs of every planner call.
pub struct PlanContext<'a> {
    /// The run's random stream.
    pub rng: &'a mut SeededRng,
    /// Tile lookup.
    pub catalog: &'a TileCatalog,
    /// Section lengths, depths and geometry.
    pub config: &'a TubeConfig,
}

/// A drafted ring plus the script state it was drafted under.
#[derive(Clone, Debug)]
pub struct PlannedRing {
    /// Ring contents.
    pub draft: RingDraft,
    /// Segment count of the previous ring.
    pub incoming_segments: u32,
    /// Level tag.
    pub level: Level,
    /// Gravity override.
    pub gravity: Option<f32>,
    /// Music cues queued since the last ring.
    pub play_tracks: BTreeSet<String>,
}

/// Navigability of the most recent ring, input to the solver.
#[derive(Clone, Debug, Default)]
struct LastRing {
    slots: usize,
    exits: Vec<Exit>,
}

/// Progress through a multi-ring step.
#[derive(Clone, Debug)]
enum Section {
    Tiles {
        width: TileWidth,
        count: usize,
        remaining: usize,
    },
    Wall {
        remaining: usize,
    },
    TrenchEntrance,
    TrenchMiddle {
        types: Vec<NavType>,
        remaining: usize,
    },
    TrenchEnd {
        types: Vec<NavType>,
    },
    Obstacle {
        multipliers: &'static [u32],
        next: usize,
    },
    Gate {
        to: u32,
        instances: Vec<Vec2>,
    },
}

/// Plays a [`LevelScript`] one ring per pull.
#[derive(Clone, Debug)]
pub struct Planner {
    script: LevelScript,
    cursor: usize,
    section: Option<Section>,
    segments: u32,
    level: Level,
    gravity: Option<f32>,
    pending_tracks: BTreeSet<String>,
    last: LastRing,
}

impl Planner {
    /// Creates a planner.
    ///
    /// # Arguments
    ///
    /// * `script` - Steps to play
    /// * `level` - Level tag until the script sets one
    /// * `initial_segments` - Segment count assumed before the first ring
    #[must_use]
    pub fn new(script: LevelScript, level: Level, initial_segments: u32) -> Self {
        Self {
            script,
            cursor: 0,
            section: None,
            segments: initial_segments.max(1),
            level,
            gravity: None,
            pending_tracks: BTreeSet::new(),
            last: LastRing {
                slots: initial_segments.max(1) as usize,
                exits: Vec::new(),
            },
        }
    }

    /// Segment count the next ring starts from.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> u32 {
        self.segments
    }

    /// Current level tag.
    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Drafts the next ring.
    ///
    /// Always returns a ring: steps that emit nothing are skipped, and a
    /// script that goes a full lap without emitting falls back to an empty
    /// ring.
    pub fn next_ring(&mut self, cx: &mut PlanContext<'_>) -> PlannedRing {
        let max_idle = 2 * self.script.steps.len() + 4;

        for _ in 0..max_idle {
            if let Some(section) = self.section.take() {
                if let Some(draft) = self.continue_section(cx, section) {
                    return self.emit(draft);
                }
                continue;
            }

            let step = self.script.step(self.cursor).clone();
            self.cursor = self.script.advance(self.cursor);

            match step {
                Step::SetSegments(n) => self.segments = n.max(1),
                Step::SetLevel(level) => self.level = level,
                Step::Cue(track) => {
                    self.pending_tracks.insert(track.to_owned());
                }
                Step::SetGravity(gravity) => self.gravity = gravity,
                Step::Empty {
                    target,
                    tiles,
                    end_radius,
                } => {
                    let mut draft = empty_ring(cx, tiles.unwrap_or(self.level), self.segments, target);
                    draft.end_radius = end_radius;
                    return self.emit(draft);
                }
                Step::Passable { delta } => {
                    let draft = passable_ring(cx, self.level, self.segments, delta);
                    return self.emit(draft);
                }
                Step::TileSection(width) => self.start_tiles(cx, width),
                Step::Trench => {
                    if let Some(draft) = self.start_trench(cx) {
                        return self.emit(draft);
                    }
                }
                Step::Wall => {
                    self.section = Some(Section::Wall {
                        remaining: cx.config.section_length,
                    });
                }
                Step::Obstacle(multipliers) => {
                    self.section = Some(Section::Obstacle { multipliers, next: 0 });
                }
                Step::Transition { to } => {
                    let draft = self.transition_ring(cx, to);
                    return self.emit(draft);
                }
            }
        }

        warn!(cursor = self.cursor, "Level script emitted nothing for a full lap, padding with an empty ring");
        let draft = empty_ring(cx, self.level, self.segments, SegmentTarget::Delta(0));
        self.emit(draft)
    }

    fn emit(&mut self, draft: RingDraft) -> PlannedRing {
        let incoming_segments = self.segments;
        self.segments = draft.segment_count();
        self.last = LastRing {
            slots: draft.slots.len(),
            exits: draft.exits.clone(),
        };
        debug!(
            level = %self.level,
            incoming_segments,
            segments = self.segments,
            slots = draft.slots.len(),
            exits = draft.exits.len(),
            "Ring drafted"
        );
        PlannedRing {
            draft,
            incoming_segments,
            level: self.level,
            gravity: self.gravity,
            play_tracks: std::mem::take(&mut self.pending_tracks),
        }
    }

    fn solve(&self, cx: &mut PlanContext<'_>, slot_count: usize, flags: SolveFlags) -> Vec<NavType> {
        solver::solve(cx.rng, slot_count, self.last.slots, &self.last.exits, flags)
    }

    fn continue_section(&mut self, cx: &mut PlanContext<'_>, section: Section) -> Option<RingDraft> {
        match section {
            Section::Tiles {
                width,
                count,
                remaining,
            } => {
                if remaining == 0 {
                    return None;
                }
                let tiles = cx.catalog.level(self.level);
                let flags = SolveFlags::new(true, true, !tiles.tiles(width, NavType::Tunnel).is_empty());
                let types = self.solve(cx, count, flags);
                let draft = tile_ring(cx, self.level, width, &types);
                self.section = Some(Section::Tiles {
                    width,
                    count,
                    remaining: remaining - 1,
                });
                Some(draft)
            }
            Section::Wall { remaining } => {
                if remaining == 0 {
                    return None;
                }
                let types = self.solve(cx, self.segments as usize, SolveFlags::WALL);
                let draft = tile_ring(cx, self.level, TileWidth::One, &types);
                self.section = Some(Section::Wall {
                    remaining: remaining - 1,
                });
                Some(draft)
            }
            Section::TrenchEntrance => {
                let count = (self.segments / 3).max(1) as usize;
                let types = self.solve(cx, count, SolveFlags::TUNNELS_ONLY);
                let draft = trench_ring(cx, self.level, Bucket::TrenchEntrance, &types)
                    .with_depths(0.0, cx.config.trench_depth);
                self.section = Some(Section::TrenchMiddle {
                    types,
                    remaining: cx.config.section_length,
                });
                Some(draft)
            }
            Section::TrenchMiddle { types, remaining } => {
                if remaining == 0 {
                    return self.continue_section(cx, Section::TrenchEnd { types });
                }
                let depth = cx.config.trench_depth;
                let draft = trench_ring(cx, self.level, Bucket::TrenchMiddle, &types).with_depths(depth, depth);
                self.section = Some(Section::TrenchMiddle {
                    types,
                    remaining: remaining - 1,
                });
                Some(draft)
            }
            Section::TrenchEnd { types } => {
                if cx.catalog.level(self.level).bucket(Bucket::TrenchEnd).is_empty() {
                    return None;
                }
                let draft = trench_ring(cx, self.level, Bucket::TrenchEnd, &types)
                    .with_depths(cx.config.trench_depth, 0.0);
                Some(draft)
            }
            Section::Obstacle { multipliers, next } => {
                let &multiplier = multipliers.get(next)?;
                let last = next + 1 == multipliers.len();
                let draft = obstacle_ring(cx, self.level, multiplier, last);
                self.section = Some(Section::Obstacle {
                    multipliers,
                    next: next + 1,
                });
                Some(draft)
            }
            Section::Gate { to, instances } => {
                let mut draft = gate_ring(cx, self.level, to);
                draft.opens_branch = Some(instances);
                Some(draft)
            }
        }
    }

    fn start_tiles(&mut self, cx: &mut PlanContext<'_>, width: Option<TileWidth>) {
        let mut width = width.unwrap_or_else(|| {
            cx.rng
                .choose_copied(&[TileWidth::One, TileWidth::Three])
                .unwrap_or(TileWidth::One)
        });
        if cx.catalog.level(self.level).tiles(TileWidth::One, NavType::Passable).is_empty() {
            width = TileWidth::Three;
        }
        let count = self.segments.div_ceil(width.units()).max(1) as usize;
        self.section = Some(Section::Tiles {
            width,
            count,
            remaining: cx.config.section_length,
        });
    }

    /// Starts a trench. Emits a corrective empty ring first when the segment
    /// count is not a positive multiple of 3.
    fn start_trench(&mut self, cx: &mut PlanContext<'_>) -> Option<RingDraft> {
        let tiles = cx.catalog.level(self.level);
        if tiles.bucket(Bucket::TrenchEntrance).is_empty() || tiles.bucket(Bucket::TrenchMiddle).is_empty() {
            debug!(level = %self.level, "No trench tiles, skipping trench");
            return None;
        }

        self.section = Some(Section::TrenchEntrance);
        if self.segments >= 3 && self.segments % 3 == 0 {
            return self.continue_section(cx, Section::TrenchEntrance);
        }

        let target = (self.segments / 3 * 3).max(3);
        debug!(from = self.segments, to = target, "Squaring segment count for trench");
        Some(empty_ring(cx, self.level, self.segments, SegmentTarget::Absolute(target)))
    }

    fn transition_ring(&mut self, cx: &mut PlanContext<'_>, to: u32) -> RingDraft {
        let count = self.segments as usize;
        let types = self.solve(cx, count, SolveFlags::TUNNELS_ONLY);

        let slots: Vec<Pick> = types
            .iter()
            .map(|&nav| {
                if nav == NavType::Impassable {
                    cx.catalog
                        .pick_bucket(cx.rng, self.level, Bucket::TransitionImpassable, TileWidth::One, nav)
                } else {
                    cx.catalog
                        .pick_bucket(cx.rng, self.level, Bucket::Transition, TileWidth::One, NavType::Tunnel)
                }
            })
            .collect();

        let radius = (to as f32 - count as f32) / cx.config.ar_factor - 3.0;
        let step = TAU / count as f32;
        let instances = slots
            .iter()
            .enumerate()
            .filter(|(_, pick)| pick.nav.is_passable())
            .map(|(i, _)| Vec2::from_angle(i as f32 * step) * radius)
            .collect();

        self.section = Some(Section::Gate { to, instances });

        let exits = slots
            .iter()
            .enumerate()
            .filter(|(_, pick)| pick.nav.is_passable())
            .map(|(i, _)| Exit::new(i, 0, 0))
            .collect();
        RingDraft::new(slots, TileWidth::One)
            .with_exits(exits)
            .with_depths(0.0, cx.config.transition_depth)
    }
}

/// Number of slots for a segment target at a width, never zero.
fn slots_for(incoming: u32, target: SegmentTarget, width: TileWidth) -> usize {
    let segments = match target {
        SegmentTarget::Delta(delta) => i64::from(incoming) + i64::from(delta),
        SegmentTarget::Absolute(n) => i64::from(n),
    };
    let units = i64::from(width.units());
    ((segments + units - 1).div_euclid(units)).max(1) as usize
}

/// A ring of empty tiles. Every slot is an exit with two swerves each way.
pub fn empty_ring(cx: &mut PlanContext<'_>, level: Level, incoming: u32, target: SegmentTarget) -> RingDraft {
    let tiles = cx.catalog.level(level);
    let width = if tiles.tiles(TileWidth::One, NavType::Empty).is_empty()
        && !tiles.tiles(TileWidth::Three, NavType::Empty).is_empty()
    {
        TileWidth::Three
    } else {
        TileWidth::One
    };
    let count = slots_for(incoming, target, width);
    let slots = (0..count)
        .map(|_| cx.catalog.pick(cx.rng, level, width, NavType::Empty))
        .collect();
    RingDraft::new(slots, width).with_uniform_exits(2, 2)
}

/// A ring of passable tiles. Every slot is an exit with one swerve each way.
pub fn passable_ring(cx: &mut PlanContext<'_>, level: Level, incoming: u32, delta: i32) -> RingDraft {
    let width = if cx.catalog.level(level).tiles(TileWidth::One, NavType::Passable).is_empty() {
        TileWidth::Three
    } else {
        TileWidth::One
    };
    let count = slots_for(incoming, SegmentTarget::Delta(delta), width);
    let slots = (0..count)
        .map(|_| cx.catalog.pick(cx.rng, level, width, NavType::Passable))
        .collect();
    RingDraft::new(slots, width).with_uniform_exits(1, 1)
}

/// A ring of regular tiles for solved slot types.
///
/// Exits: tunnels can only be flown straight out of; open slots may swerve
/// towards open neighbors.
pub fn tile_ring(cx: &mut PlanContext<'_>, level: Level, width: TileWidth, types: &[NavType]) -> RingDraft {
    let slots: Vec<Pick> = types
        .iter()
        .map(|&nav| cx.catalog.pick(cx.rng, level, width, nav))
        .collect();

    let n = slots.len();
    let nav_at = |i: isize| slots[solver::wrap(i, n)].nav;
    let exits = (0..n)
        .filter_map(|i| {
            let k = i as isize;
            match slots[i].nav {
                NavType::Tunnel => Some(Exit::new(i, 0, 0)),
                NavType::Passable | NavType::Empty => Some(Exit::new(
                    i,
                    u8::from(nav_at(k - 1).is_open()),
                    u8::from(nav_at(k + 1).is_open()),
                )),
                NavType::Swervible | NavType::Impassable => None,
            }
        })
        .collect();

    RingDraft::new(slots, width).with_exits(exits)
}

/// A width-3 trench ring: `bucket` tiles in tunnel slots, impassable trench
/// tiles elsewhere. Open slots are exits without swerving.
fn trench_ring(cx: &mut PlanContext<'_>, level: Level, bucket: Bucket, types: &[NavType]) -> RingDraft {
    let slots: Vec<Pick> = types
        .iter()
        .map(|&nav| {
            if nav == NavType::Tunnel {
                cx.catalog.pick_bucket(cx.rng, level, bucket, TileWidth::Three, NavType::Tunnel)
            } else {
                cx.catalog
                    .pick_bucket(cx.rng, level, Bucket::TrenchImpassable, TileWidth::Three, NavType::Impassable)
            }
        })
        .collect();

    let exits = slots
        .iter()
        .enumerate()
        .filter(|(_, pick)| pick.nav.is_passable())
        .map(|(i, _)| Exit::new(i, 0, 0))
        .collect();
    RingDraft::new(slots, TileWidth::Three).with_exits(exits)
}

/// A ring made of the level's obstacle tiles repeated `multiplier` times.
///
/// Obstacle rings have no exits, except the last of a run which gets one
/// random exit among its first three slots.
fn obstacle_ring(cx: &mut PlanContext<'_>, level: Level, multiplier: u32, last: bool) -> RingDraft {
    let bucket = cx.catalog.level(level).bucket(Bucket::Obstacle);
    let slots: Vec<Pick> = if bucket.is_empty() {
        (0..multiplier.max(1))
            .map(|_| cx.catalog.pick(cx.rng, level, TileWidth::One, NavType::Passable))
            .collect()
    } else {
        (0..multiplier)
            .flat_map(|_| bucket.iter())
            .map(|prototype| Pick {
                prototype: Arc::clone(prototype),
                nav: NavType::Passable,
            })
            .collect()
    };

    let mut draft = RingDraft::new(slots, TileWidth::One);
    if last {
        let index = cx.rng.range(0..3.min(draft.slots.len()));
        draft.exits.push(Exit::new(index, 0, 0));
    }
    draft
}

/// First ring of a new branch: `to` gate tiles, every slot an exit.
fn gate_ring(cx: &mut PlanContext<'_>, level: Level, to: u32) -> RingDraft {
    let slots = (0..to.max(1))
        .map(|_| {
            cx.catalog
                .pick_bucket(cx.rng, level, Bucket::Gate, TileWidth::One, NavType::Passable)
        })
        .collect();
    RingDraft::new(slots, TileWidth::One).with_uniform_exits(1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{RawSegment, SegmentLibrary};
    use donk_core::RunSeed;

    struct Fixture {
        rng: SeededRng,
        catalog: TileCatalog,
        config: TubeConfig,
    }

    impl Fixture {
        fn new(library: &SegmentLibrary) -> Self {
            Self {
                rng: SeededRng::new(RunSeed::new(2)),
                catalog: TileCatalog::build(library),
                config: TubeConfig::default(),
            }
        }

        fn cx(&mut self) -> PlanContext<'_> {
            PlanContext {
                rng: &mut self.rng,
                catalog: &self.catalog,
                config: &self.config,
            }
        }
    }

    #[test]
    fn test_script_for_run() {
        let from_steel = LevelScript::for_run(Level::Steel);
        let from_flesh = LevelScript::for_run(Level::Flesh);
        assert!(from_steel.steps().contains(&Step::SetLevel(Level::Rift)));
        assert!(!from_flesh.steps().contains(&Step::SetLevel(Level::Rift)));
        assert_eq!(from_flesh.steps()[from_flesh.loop_start], Step::empty());
        assert_eq!(from_steel.steps().len() - from_steel.loop_start, 5);
    }

    #[test]
    fn test_steel_opening() {
        let mut fx = Fixture::new(&SegmentLibrary::standard());
        let mut planner = Planner::new(LevelScript::for_run(Level::Steel), Level::Steel, 20);
        let mut cx = fx.cx();

        let first = planner.next_ring(&mut cx);
        assert_eq!(first.incoming_segments, 2);
        assert_eq!(first.draft.segment_count(), 20);
        assert!(first.play_tracks.contains("steel"));

        let second = planner.next_ring(&mut cx);
        assert_eq!(second.draft.segment_count(), 30);
        assert!(second.play_tracks.is_empty());

        // width-3 tile section over 30 segments
        let third = planner.next_ring(&mut cx);
        assert_eq!(third.draft.width, TileWidth::Three);
        assert_eq!(third.draft.slots.len(), 10);
    }

    #[test]
    fn test_trench_squares_segments() {
        let mut fx = Fixture::new(&SegmentLibrary::standard());
        let script = LevelScript::new(vec![Step::SetSegments(20), Step::empty(), Step::Trench], 1);
        let mut planner = Planner::new(script, Level::Steel, 20);
        let mut cx = fx.cx();

        planner.next_ring(&mut cx);
        let corrective = planner.next_ring(&mut cx);
        assert_eq!(corrective.draft.segment_count(), 18);

        let entrance = planner.next_ring(&mut cx);
        assert_eq!(entrance.draft.width, TileWidth::Three);
        assert_eq!(entrance.draft.slots.len(), 6);
        assert_eq!(entrance.draft.end_depth, cx.config.trench_depth);
        assert!(entrance.draft.exits.iter().all(|e| e.left == 0 && e.right == 0));
        assert!(!entrance.draft.exits.is_empty());

        for _ in 0..cx.config.section_length {
            let middle = planner.next_ring(&mut cx);
            assert_eq!(middle.draft.start_depth, cx.config.trench_depth);
            assert_eq!(middle.draft.end_depth, cx.config.trench_depth);
            assert_eq!(middle.draft.exits, entrance.draft.exits);
        }

        let end = planner.next_ring(&mut cx);
        assert_eq!(end.draft.start_depth, cx.config.trench_depth);
        assert_eq!(end.draft.end_depth, 0.0);
    }

    #[test]
    fn test_trench_skipped_without_tiles() {
        let library = SegmentLibrary::new(vec![
            RawSegment::new("rift_tile1_empty"),
            RawSegment::new("rift_tile1_passable_a"),
        ]);
        let mut fx = Fixture::new(&library);
        let script = LevelScript::new(vec![Step::Trench, Step::Passable { delta: 0 }], 0);
        let mut planner = Planner::new(script, Level::Rift, 9);
        let mut cx = fx.cx();

        let ring = planner.next_ring(&mut cx);
        assert!(ring.draft.slots.iter().all(|p| p.nav == NavType::Passable));
        assert_eq!(ring.draft.segment_count(), 9);
    }

    #[test]
    fn test_obstacle_run() {
        let mut fx = Fixture::new(&SegmentLibrary::standard());
        let script = LevelScript::new(vec![Step::Obstacle(&[4, 2]), Step::empty()], 1);
        let mut planner = Planner::new(script, Level::Flesh, 20);
        let mut cx = fx.cx();
        let per = cx.catalog.level(Level::Flesh).bucket(Bucket::Obstacle).len();

        let a = planner.next_ring(&mut cx);
        assert_eq!(a.draft.slots.len(), per * 4);
        assert!(a.draft.exits.is_empty());

        let b = planner.next_ring(&mut cx);
        assert_eq!(b.draft.slots.len(), per * 2);
        assert_eq!(b.draft.exits.len(), 1);
        assert!(b.draft.exits[0].index < 3);
        assert!(b.draft.slots.iter().all(|p| p.nav == NavType::Passable));
    }

    #[test]
    fn test_transition_opens_branch() {
        let mut fx = Fixture::new(&SegmentLibrary::standard());
        let script = LevelScript::new(
            vec![Step::SetSegments(12), Step::Passable { delta: 0 }, Step::Transition { to: 6 }, Step::empty()],
            3,
        );
        let mut planner = Planner::new(script, Level::Flesh, 12);
        let mut cx = fx.cx();

        planner.next_ring(&mut cx);
        let transition = planner.next_ring(&mut cx);
        assert_eq!(transition.draft.slots.len(), 12);
        assert_eq!(transition.draft.end_depth, cx.config.transition_depth);
        assert!(transition.draft.opens_branch.is_none());

        let gate = planner.next_ring(&mut cx);
        assert_eq!(gate.incoming_segments, 12);
        assert_eq!(gate.draft.slots.len(), 6);
        let instances = gate.draft.opens_branch.as_ref().unwrap();
        let open = transition.draft.slots.iter().filter(|p| p.nav.is_passable()).count();
        assert_eq!(instances.len(), open);
        assert!(open > 0);

        let expected = ((6.0 - 12.0) / cx.config.ar_factor - 3.0_f32).abs();
        assert!(instances.iter().all(|c| (c.length() - expected).abs() < 1e-4));
    }

    #[test]
    fn test_cues_and_gravity() {
        let mut fx = Fixture::new(&SegmentLibrary::standard());
        let mut planner = Planner::new(LevelScript::for_run(Level::Flesh), Level::Flesh, 20);
        let mut cx = fx.cx();

        // rift-tiled opener, then the mouth
        let opener = planner.next_ring(&mut cx);
        assert_eq!(opener.draft.segment_count(), 6);
        let mouth = planner.next_ring(&mut cx);
        assert!(mouth.play_tracks.contains("flesh"));
        assert_eq!(mouth.level, Level::Flesh);
        assert_eq!(mouth.incoming_segments, 200);

        for _ in 0..4 {
            planner.next_ring(&mut cx);
        }
        let stomach = planner.next_ring(&mut cx);
        assert_eq!(stomach.draft.segment_count(), 3);
        assert_eq!(stomach.draft.end_radius, Some(1.0));
        assert_eq!(stomach.gravity, Some(0.5));

        let after = planner.next_ring(&mut cx);
        assert_eq!(after.gravity, None);
        assert_eq!(after.incoming_segments, 40);
    }

    #[test]
    fn test_empty_script_still_emits() {
        let mut fx = Fixture::new(&SegmentLibrary::default());
        let mut planner = Planner::new(LevelScript::new(vec![Step::Trench], 0), Level::Steel, 4);
        let mut cx = fx.cx();

        let ring = planner.next_ring(&mut cx);
        assert_eq!(ring.draft.slots.len(), 4);
        assert!(ring.draft.slots.iter().all(|p| Arc::ptr_eq(&p.prototype, cx.catalog.placeholder())));
    }
}
