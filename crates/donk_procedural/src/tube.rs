//! # Tube Manager
//!
//! Owns the live ring chain and streams it past the player.
//!
//! ```text
//!        cull threshold         player (0)
//!              │                   │
//!  first ──▶ [ring] ──▶ [ring] ──▶ [current] ──▶ ... ──▶ last
//!              ▲                                          ▲
//!        freed when behind               one pulled per tick while the
//!        the threshold                   window ahead is short
//! ```
//!
//! ## Design
//!
//! Rings live in a generational [`SlotPool`]; `next` links are pool handles.
//! `first`, `last` and `current` always name live rings: the chain is never
//! empty, and culling stops at the current ring.
//!
//! Only the head ring's position is moved by a shift. Every later ring is
//! re-placed one spacing past its parent, so neighbours never drift apart
//! and the player is always inside some ring of the chain. A player that
//! outruns the whole chain in one step has the chain moved up under them
//! and the stale rings behind culled.
//!
//! Each tick is bounded: one walk to shift positions, one scan for the
//! current ring, culls from the front, and at most `rings_per_tick` pulls
//! from the generator. The window counts rings past a branch boundary, so
//! the new branch streams in before the player reaches it.

use std::collections::BTreeMap;
use std::sync::Arc;

use donk_core::{PoolHandle, SlotPool, Vec2};
use tracing::{debug, info, warn};

use crate::catalog::TileCatalog;
use crate::config::TubeConfig;
use crate::error::TubeResult;
use crate::generator::{Generated, TubeGenerator};
use crate::library::SegmentLibrary;
use crate::ring::{Branch, BranchId, Ring};

/// Counters over the life of a tube.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TubeStats {
    /// Rings pulled from the generator.
    pub generated: u64,
    /// Rings freed behind the player.
    pub culled: u64,
    /// Padding rings added behind the player by rewinds.
    pub padded: u64,
    /// Times the active branch changed.
    pub branch_swaps: u64,
}

/// The streaming ring chain.
#[derive(Debug)]
pub struct TubeManager {
    generator: TubeGenerator,
    rings: SlotPool<Ring>,
    first: PoolHandle,
    last: PoolHandle,
    current: PoolHandle,
    active_branch: BranchId,
    branches: BTreeMap<BranchId, Branch>,
    paused: bool,
    y: f32,
    stats: TubeStats,
}

impl TubeManager {
    /// Creates a tube and fills its look-ahead window.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
    /// let mut tube = TubeManager::new(TubeConfig::production(), catalog)?;
    /// tube.advance(0.2);
    /// let radius = tube.current_ring().radius_at(0.0);
    /// ```
    pub fn new(config: TubeConfig, catalog: Arc<TileCatalog>) -> TubeResult<Self> {
        let look_ahead = config.look_ahead;
        let mut generator = TubeGenerator::new(config, catalog)?;

        let mut rings = SlotPool::with_capacity(look_ahead * 2);
        let Generated { ring, new_branch } = generator.pull(None);
        let active_branch = ring.branch;
        let head = rings.insert(ring);

        let mut branches = BTreeMap::new();
        branches.insert(
            BranchId::TRUNK,
            Branch {
                id: BranchId::TRUNK,
                instances: vec![Vec2::ZERO],
            },
        );
        if let Some(branch) = new_branch {
            branches.insert(branch.id, branch);
        }

        let mut tube = Self {
            generator,
            rings,
            first: head,
            last: head,
            current: head,
            active_branch,
            branches,
            paused: false,
            y: 0.0,
            stats: TubeStats {
                generated: 1,
                ..TubeStats::default()
            },
        };
        for _ in 0..look_ahead {
            tube.generate_one();
        }

        info!(look_ahead, rings = tube.rings.len(), "Tube ready");
        Ok(tube)
    }

    /// Creates a tube over the built-in segment library.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_standard_library(config: TubeConfig) -> TubeResult<Self> {
        let catalog = Arc::new(TileCatalog::build(&SegmentLibrary::standard()));
        Self::new(config, catalog)
    }

    /// Moves the player forward along the tube.
    ///
    /// Shifts every ring back by `delta`, rescans the current ring, culls
    /// rings behind the threshold and pulls at most `rings_per_tick` new
    /// rings. Does nothing while paused.
    pub fn advance(&mut self, delta: f32) {
        if self.paused {
            return;
        }
        self.y += delta;
        self.shift_all(-delta);
        self.refresh();
    }

    /// Jumps the player to an absolute distance along the tube.
    ///
    /// Used for crash recovery. Jumping backwards moves rings ahead of the
    /// player; padding rings are prepended until a ring covers the player
    /// again. Padding draws no randomness, so the rings ahead are the same
    /// as without the jump.
    pub fn set_y(&mut self, y: f32) {
        let delta = y - self.y;
        self.shift_all(-delta);
        self.y = y;

        let cap = self.generator.config().look_ahead * 4;
        let mut padded = 0usize;
        loop {
            let head = &self.rings[self.first];
            if head.position - head.span / 2.0 <= 0.0 {
                break;
            }
            if padded >= cap {
                warn!(padded, y, "Backfill cap reached, player left outside the tube");
                break;
            }
            let mut pad = self.generator.padding_ring(head);
            pad.next = Some(self.first);
            self.first = self.rings.insert(pad);
            padded += 1;
        }
        self.stats.padded += padded as u64;
        if padded > 0 {
            self.shift_all(0.0);
        }

        self.refresh();
        info!(y, delta, padded, current = self.current_ring().serial, "Tube repositioned");
    }

    /// Freezes advancement, generation and the current-ring scan.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Undoes [`pause`](Self::pause).
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the tube is paused.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The ring under the player.
    #[inline]
    #[must_use]
    pub fn current_ring(&self) -> &Ring {
        &self.rings[self.current]
    }

    /// The oldest live ring.
    #[inline]
    #[must_use]
    pub fn first_ring(&self) -> &Ring {
        &self.rings[self.first]
    }

    /// The newest ring.
    #[inline]
    #[must_use]
    pub fn last_ring(&self) -> &Ring {
        &self.rings[self.last]
    }

    /// The ring after the current one, if generated.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Ring> {
        self.current_ring().next.map(|h| &self.rings[h])
    }

    /// The ring after the current one, generating it if needed.
    pub fn next_ring(&mut self) -> &Ring {
        if self.current == self.last {
            self.generate_one();
        }
        let next = self.rings[self.current].next.unwrap_or(self.last);
        &self.rings[next]
    }

    /// Live rings from first to last.
    pub fn iter(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::successors(self.rings.get(self.first), move |ring| {
            ring.next.and_then(|h| self.rings.get(h))
        })
    }

    /// Rings from the current ring to the last, inclusive.
    #[must_use]
    pub fn window_len(&self) -> usize {
        std::iter::successors(Some(self.current), |&h| self.rings[h].next).count()
    }

    /// Number of live rings.
    #[inline]
    #[must_use]
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Branch the current ring belongs to.
    #[inline]
    #[must_use]
    pub fn active_branch(&self) -> BranchId {
        self.active_branch
    }

    /// A registered branch. Branches are released once the player has moved
    /// past them into a newer one.
    #[must_use]
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(&id)
    }

    /// Distance travelled.
    #[inline]
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Lifetime counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> TubeStats {
        self.stats
    }

    /// The configuration the tube runs with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        self.generator.config()
    }

    /// Moves the head ring by `delta` and re-places the rest of the chain
    /// behind it.
    fn shift_all(&mut self, delta: f32) {
        let spacing = self.generator.config().ring_spacing;
        let head = &mut self.rings[self.first];
        head.shift(delta);
        let (mut position, mut cursor) = (head.position, head.next);
        while let Some(handle) = cursor {
            let ring = &mut self.rings[handle];
            position += spacing;
            ring.position = position;
            cursor = ring.next;
        }
    }

    /// Rescans the current ring, then culls, then tops up the window.
    fn refresh(&mut self) {
        self.scan_current();
        if self.rings[self.current].progress_at(0.0) > 1.0 {
            self.reanchor();
        }
        self.cull();
        if !self.paused {
            self.fill_window();
        }
    }

    /// The player is past the end of the chain: moves the chain up so the
    /// last ring sits under the player again.
    fn reanchor(&mut self) {
        let last = &self.rings[self.last];
        let (serial, offset) = (last.serial, -last.position);
        warn!(serial, offset, y = self.y, "Player outran the tube, chain moved up");
        self.shift_all(offset);
        self.current = self.last;
    }

    fn scan_current(&mut self) {
        let mut cursor = Some(self.first);
        let mut found = self.last;
        while let Some(handle) = cursor {
            let ring = &self.rings[handle];
            if ring.progress_at(0.0) <= 1.0 {
                found = handle;
                break;
            }
            cursor = ring.next;
        }
        self.current = found;

        let branch = self.rings[found].branch;
        if branch != self.active_branch {
            let previous = self.active_branch;
            self.active_branch = branch;
            self.branches.retain(|id, _| *id >= branch);
            self.stats.branch_swaps += 1;
            info!(from = previous.0, to = branch.0, "Active branch swapped");
        }
    }

    fn cull(&mut self) {
        let cull_offset = self.generator.config().cull_offset;
        while self.first != self.current && self.rings[self.first].needs_cull(cull_offset) {
            let Some(ring) = self.rings.remove(self.first) else {
                break;
            };
            debug!(serial = ring.serial, position = ring.position, "Ring culled");
            self.stats.culled += 1;
            match ring.next {
                Some(next) => self.first = next,
                None => break,
            }
        }
    }

    fn fill_window(&mut self) {
        let config = self.generator.config();
        let (look_ahead, budget) = (config.look_ahead, config.rings_per_tick);
        for _ in 0..budget {
            if self.window_len() >= look_ahead {
                break;
            }
            self.generate_one();
        }
    }

    fn generate_one(&mut self) {
        let parent = self.rings[self.last].position;
        let Generated { ring, new_branch } = self.generator.pull(Some(parent));
        debug!(
            serial = ring.serial,
            segments = ring.segment_count(),
            level = %ring.level,
            position = ring.position,
            "Ring generated"
        );
        if let Some(branch) = new_branch {
            self.branches.insert(branch.id, branch);
        }

        let handle = self.rings.insert(ring);
        self.rings[self.last].next = Some(handle);
        self.last = handle;
        self.stats.generated += 1;
    }
}
