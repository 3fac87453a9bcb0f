//! # Tile Catalog
//!
//! Sorts a [`SegmentLibrary`] into lookup tables by level, width and
//! navigability, plus the special buckets used by trenches, transitions and
//! obstacle sections.
//!
//! ## Design
//!
//! - Built once at startup; read-only afterwards.
//! - Prototypes are shared through `Arc`, every ring slot that shows a tile
//!   points at the same record.
//! - Bucket order is library order, so random picks are reproducible.
//! - Lookups never fail. A missing bucket falls back to the nearest
//!   permissive type, then the other width, then a built-in placeholder.

use std::collections::BTreeMap;
use std::sync::Arc;

use donk_core::SeededRng;
use tracing::{debug, info};

use crate::library::{RawPolygon, SegmentLibrary};
use crate::nav::{Level, NavTable, NavType, TileWidth};

/// Shapes whose normal leans further than this towards up/down are floors.
const MAX_NORMAL_Z: f32 = 0.7;
/// Shapes whose normal points further than this along the travel axis face
/// away from the ship.
const MAX_NORMAL_Y: f32 = 0.2;

/// Order in which substitutes are tried for a missing navigation bucket.
const FALLBACK_ORDER: [NavType; 3] = [NavType::Passable, NavType::Tunnel, NavType::Empty];

/// Handle to the visual geometry of a prototype (its library position).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub usize);

/// An immutable segment prototype.
#[derive(Debug, PartialEq)]
pub struct SegmentPrototype {
    /// Geometry handle.
    pub geometry: GeometryHandle,
    /// Name without the level prefix.
    pub name: String,
    /// Level the tile belongs to.
    pub level: Level,
    /// Width class.
    pub width: TileWidth,
    /// Navigability the tile was classified as.
    pub nav: NavType,
    /// Collision shapes that survived culling.
    pub collision: Vec<RawPolygon>,
}

/// All tiles of one level.
#[derive(Debug, Default)]
pub struct TileSet {
    tile1: NavTable<Vec<Arc<SegmentPrototype>>>,
    tile3: NavTable<Vec<Arc<SegmentPrototype>>>,
    trench_entrance: Vec<Arc<SegmentPrototype>>,
    trench_middle: Vec<Arc<SegmentPrototype>>,
    trench_end: Vec<Arc<SegmentPrototype>>,
    trench_impassable: Vec<Arc<SegmentPrototype>>,
    transition: Vec<Arc<SegmentPrototype>>,
    transition_impassable: Vec<Arc<SegmentPrototype>>,
    gate: Vec<Arc<SegmentPrototype>>,
    obstacle: Vec<Arc<SegmentPrototype>>,
    by_name: BTreeMap<String, Arc<SegmentPrototype>>,
}

/// Special-purpose buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    /// First ring of a trench, passable slots.
    TrenchEntrance,
    /// Constant-depth trench rings, passable slots.
    TrenchMiddle,
    /// Last ring of a trench, passable slots.
    TrenchEnd,
    /// Solid slots of every trench ring.
    TrenchImpassable,
    /// Open slots of a transition ring.
    Transition,
    /// Solid slots of a transition ring.
    TransitionImpassable,
    /// Open slots of the first ring past a transition.
    Gate,
    /// Obstacle section tiles.
    Obstacle,
}

/// Nav prefixes in match order; first match wins.
const TILE_PREFIXES: [(&str, TileWidth, NavType); 12] = [
    ("tile1_empty", TileWidth::One, NavType::Empty),
    ("tile1_impassable", TileWidth::One, NavType::Impassable),
    ("tile1_impasssable", TileWidth::One, NavType::Impassable), // sic, shipped asset name
    ("tile1_swervible", TileWidth::One, NavType::Swervible),
    ("tile1_passable_tunnel", TileWidth::One, NavType::Tunnel),
    ("tile1_passable", TileWidth::One, NavType::Passable),
    ("tile3_empty", TileWidth::Three, NavType::Empty),
    ("tile3_impassable", TileWidth::Three, NavType::Impassable),
    ("tile3_swervible", TileWidth::Three, NavType::Swervible),
    ("tile3_swirvible", TileWidth::Three, NavType::Swervible), // sic
    ("tile3_passable_tunnel", TileWidth::Three, NavType::Tunnel),
    ("tile3_passable", TileWidth::Three, NavType::Passable),
];

const TRENCH_PREFIXES: [(&str, Bucket, NavType); 4] = [
    ("trench3_entrance", Bucket::TrenchEntrance, NavType::Tunnel),
    ("trench3_end", Bucket::TrenchEnd, NavType::Tunnel),
    ("trench3_middle", Bucket::TrenchMiddle, NavType::Tunnel),
    ("trench3_impassable", Bucket::TrenchImpassable, NavType::Impassable),
];

/// How a name was classified.
struct Classification {
    width: TileWidth,
    nav: NavType,
    tile: Option<(TileWidth, NavType)>,
    buckets: Vec<Bucket>,
}

/// Classifies a level-stripped name. None for names no rule matches.
fn classify(name: &str) -> Option<Classification> {
    let mut buckets = Vec::new();
    let mut tile = None;
    let mut nav = None;

    if let Some((_, bucket, trench_nav)) = TRENCH_PREFIXES.iter().find(|(p, ..)| name.starts_with(p)) {
        buckets.push(*bucket);
        nav = Some(*trench_nav);
    } else if let Some((_, width, tile_nav)) = TILE_PREFIXES.iter().find(|(p, ..)| name.starts_with(p)) {
        tile = Some((*width, *tile_nav));
        nav = Some(*tile_nav);
    }

    if name.starts_with("tile1_transition_impassable") {
        buckets.push(Bucket::TransitionImpassable);
        nav.get_or_insert(NavType::Impassable);
    } else if name.starts_with("tile1_transition") {
        buckets.push(Bucket::Transition);
        nav.get_or_insert(NavType::Tunnel);
    }
    if name.contains("passable_gate") || name.contains("passable_obstacle") {
        buckets.push(Bucket::Gate);
        nav.get_or_insert(NavType::Passable);
    }
    if name.contains("obstacle") && name.contains("tile1") {
        buckets.push(Bucket::Obstacle);
        nav.get_or_insert(NavType::Passable);
    }

    let nav = nav?;
    let width = if name.contains("tile3") || name.contains("trench3") {
        TileWidth::Three
    } else {
        TileWidth::One
    };
    Some(Classification {
        width,
        nav,
        tile,
        buckets,
    })
}

/// Whether a collision polygon should be discarded for a tile.
///
/// Discards shapes that do not face the oncoming ship, and shapes outside
/// the depth band the ship can reach for that tile family.
#[must_use]
pub fn should_cull_polygon(name: &str, polygon: &RawPolygon) -> bool {
    if polygon.normal.z.abs() > MAX_NORMAL_Z || polygon.normal.y > MAX_NORMAL_Y {
        return true;
    }

    let Some((lowest, highest)) = polygon.z_extent() else {
        return true;
    };

    if name.contains("trench3_middle") && (lowest > -2.0 || highest <= -3.0) {
        return true;
    }

    if !name.contains("trench") && (lowest > 0.5 || highest <= 0.0) {
        return true;
    }

    false
}

impl TileSet {
    fn add(&mut self, prototype: Arc<SegmentPrototype>, class: &Classification) {
        if let Some((width, nav)) = class.tile {
            match width {
                TileWidth::One => self.tile1[nav].push(Arc::clone(&prototype)),
                TileWidth::Three => self.tile3[nav].push(Arc::clone(&prototype)),
            }
        }
        for bucket in &class.buckets {
            self.bucket_mut(*bucket).push(Arc::clone(&prototype));
        }
        self.by_name.insert(prototype.name.clone(), prototype);
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Arc<SegmentPrototype>> {
        match bucket {
            Bucket::TrenchEntrance => &mut self.trench_entrance,
            Bucket::TrenchMiddle => &mut self.trench_middle,
            Bucket::TrenchEnd => &mut self.trench_end,
            Bucket::TrenchImpassable => &mut self.trench_impassable,
            Bucket::Transition => &mut self.transition,
            Bucket::TransitionImpassable => &mut self.transition_impassable,
            Bucket::Gate => &mut self.gate,
            Bucket::Obstacle => &mut self.obstacle,
        }
    }

    /// Tiles of one width and navigation type, in library order.
    #[must_use]
    pub fn tiles(&self, width: TileWidth, nav: NavType) -> &[Arc<SegmentPrototype>] {
        match width {
            TileWidth::One => &self.tile1[nav],
            TileWidth::Three => &self.tile3[nav],
        }
    }

    /// Tiles of a special-purpose bucket, in library order.
    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &[Arc<SegmentPrototype>] {
        match bucket {
            Bucket::TrenchEntrance => &self.trench_entrance,
            Bucket::TrenchMiddle => &self.trench_middle,
            Bucket::TrenchEnd => &self.trench_end,
            Bucket::TrenchImpassable => &self.trench_impassable,
            Bucket::Transition => &self.transition,
            Bucket::TransitionImpassable => &self.transition_impassable,
            Bucket::Gate => &self.gate,
            Bucket::Obstacle => &self.obstacle,
        }
    }

    /// Looks up a tile by its level-stripped name.
    #[must_use]
    pub fn segment(&self, name: &str) -> Option<&Arc<SegmentPrototype>> {
        self.by_name.get(name)
    }

    /// Number of distinct tiles in the level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if the level has no tiles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Resolves a requested bucket to the one lookups will actually draw
    /// from, walking the fallback order.
    ///
    /// # Returns
    ///
    /// The tiles plus the navigation type they stand for, or None when the
    /// level has no usable tiles at all.
    #[must_use]
    pub fn resolve(&self, width: TileWidth, nav: NavType) -> Option<(&[Arc<SegmentPrototype>], NavType)> {
        for w in [width, width.other()] {
            let candidates = std::iter::once(nav).chain(FALLBACK_ORDER.into_iter().filter(|t| *t != nav));
            for candidate in candidates {
                let tiles = self.tiles(w, candidate);
                if !tiles.is_empty() {
                    return Some((tiles, candidate));
                }
            }
        }
        None
    }
}

/// A tile chosen for a slot.
#[derive(Clone, Debug)]
pub struct Pick {
    /// The prototype to instance.
    pub prototype: Arc<SegmentPrototype>,
    /// The navigation type the slot actually has.
    pub nav: NavType,
}

/// Per-level lookup tables for every segment prototype.
#[derive(Debug)]
pub struct TileCatalog {
    sets: [TileSet; 3],
    placeholder: Arc<SegmentPrototype>,
}

impl TileCatalog {
    /// Builds the catalog from a library.
    ///
    /// Names that match no level prefix or no category are skipped.
    /// Collision shapes are culled here once, so rings never see them.
    #[must_use]
    pub fn build(library: &SegmentLibrary) -> Self {
        let mut sets: [TileSet; 3] = Default::default();
        let mut skipped = 0usize;

        for (index, raw) in library.segments().iter().enumerate() {
            let Some((prefix, rest)) = raw.name.split_once('_') else {
                debug!(name = %raw.name, "Segment name has no level prefix, skipped");
                skipped += 1;
                continue;
            };
            let Ok(level) = prefix.parse::<Level>() else {
                debug!(name = %raw.name, "Segment belongs to no level, skipped");
                skipped += 1;
                continue;
            };
            let Some(class) = classify(rest) else {
                debug!(name = %raw.name, "Segment matches no category, skipped");
                skipped += 1;
                continue;
            };

            let collision = raw
                .collision
                .iter()
                .filter(|polygon| !should_cull_polygon(rest, polygon))
                .cloned()
                .collect();

            let prototype = Arc::new(SegmentPrototype {
                geometry: GeometryHandle(index),
                name: rest.to_owned(),
                level,
                width: class.width,
                nav: class.nav,
                collision,
            });
            sets[level.index()].add(prototype, &class);
        }

        for level in Level::ALL {
            let set = &sets[level.index()];
            info!(
                level = %level,
                tiles = set.len(),
                tile1 = set.tile1.iter().map(|(_, v)| v.len()).sum::<usize>(),
                tile3 = set.tile3.iter().map(|(_, v)| v.len()).sum::<usize>(),
                trench = set.trench_entrance.len() + set.trench_middle.len(),
                "Tile set built"
            );
        }
        if skipped > 0 {
            debug!(skipped, "Unrecognized segments ignored");
        }

        Self {
            sets,
            placeholder: Arc::new(SegmentPrototype {
                geometry: GeometryHandle(usize::MAX),
                name: "placeholder".to_owned(),
                level: Level::Steel,
                width: TileWidth::One,
                nav: NavType::Passable,
                collision: Vec::new(),
            }),
        }
    }

    /// The tile set of a level.
    #[inline]
    #[must_use]
    pub fn level(&self, level: Level) -> &TileSet {
        &self.sets[level.index()]
    }

    /// The always-passable prototype used when a level has no tiles.
    #[must_use]
    pub fn placeholder(&self) -> &Arc<SegmentPrototype> {
        &self.placeholder
    }

    /// Picks a random tile for a slot, degrading if the bucket is empty.
    ///
    /// Consumes randomness only when a non-empty bucket is found.
    pub fn pick(&self, rng: &mut SeededRng, level: Level, width: TileWidth, nav: NavType) -> Pick {
        match self.level(level).resolve(width, nav) {
            Some((tiles, effective)) => {
                if effective != nav {
                    debug!(level = %level, ?width, requested = ?nav, used = ?effective, "Tile bucket empty, substituting");
                }
                let prototype = rng.choose(tiles).map_or_else(|| Arc::clone(&self.placeholder), Arc::clone);
                Pick {
                    prototype,
                    nav: effective,
                }
            }
            None => self.placeholder_pick(),
        }
    }

    /// Picks a tile deterministically without drawing randomness.
    ///
    /// Used for filler rings that must not disturb the generation stream.
    #[must_use]
    pub fn pick_nth(&self, level: Level, width: TileWidth, nav: NavType, n: usize) -> Pick {
        match self.level(level).resolve(width, nav) {
            Some((tiles, effective)) => Pick {
                prototype: Arc::clone(&tiles[n % tiles.len()]),
                nav: effective,
            },
            None => self.placeholder_pick(),
        }
    }

    /// Picks from a special bucket, or falls back to a regular width-class
    /// tile of `nav` when the bucket is empty.
    pub fn pick_bucket(
        &self,
        rng: &mut SeededRng,
        level: Level,
        bucket: Bucket,
        width: TileWidth,
        nav: NavType,
    ) -> Pick {
        match rng.choose(self.level(level).bucket(bucket)) {
            Some(prototype) => Pick {
                prototype: Arc::clone(prototype),
                nav,
            },
            None => {
                debug!(level = %level, ?bucket, "Special bucket empty, substituting");
                self.pick(rng, level, width, nav)
            }
        }
    }

    fn placeholder_pick(&self) -> Pick {
        Pick {
            prototype: Arc::clone(&self.placeholder),
            nav: NavType::Passable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::RawSegment;
    use donk_core::{RunSeed, Vec3};

    fn poly(normal: Vec3, low: f32, high: f32) -> RawPolygon {
        RawPolygon {
            normal,
            points: vec![Vec3::new(0.0, 0.0, low), Vec3::new(1.0, 0.0, high)],
        }
    }

    #[test]
    fn test_classification_with_typos() {
        let library = SegmentLibrary::new(vec![
            RawSegment::new("steel_tile1_impasssable_x"),
            RawSegment::new("steel_tile3_swirvible_x"),
            RawSegment::new("steel_tile1_passable_tunnel_x"),
            RawSegment::new("steel_tile1_passable_x"),
            RawSegment::new("steel_nonsense"),
            RawSegment::new("moon_tile1_passable"),
            RawSegment::new("noprefix"),
        ]);
        let catalog = TileCatalog::build(&library);
        let steel = catalog.level(Level::Steel);

        assert_eq!(steel.tiles(TileWidth::One, NavType::Impassable).len(), 1);
        assert_eq!(steel.tiles(TileWidth::Three, NavType::Swervible).len(), 1);
        assert_eq!(steel.tiles(TileWidth::One, NavType::Tunnel).len(), 1);
        // Tunnel tiles must not leak into the plain passable bucket
        assert_eq!(steel.tiles(TileWidth::One, NavType::Passable).len(), 1);
        assert_eq!(steel.len(), 4);
        assert!(steel.segment("nonsense").is_none());
    }

    #[test]
    fn test_special_buckets() {
        let library = SegmentLibrary::new(vec![
            RawSegment::new("flesh_tile1_transition_impassable"),
            RawSegment::new("flesh_tile1_transition"),
            RawSegment::new("flesh_tile1_passable_gate_a"),
            RawSegment::new("flesh_tile1_passable_obstacle_a"),
            RawSegment::new("flesh_tile1_obstacle_tooth"),
            RawSegment::new("flesh_trench3_middle_a"),
        ]);
        let catalog = TileCatalog::build(&library);
        let flesh = catalog.level(Level::Flesh);

        assert_eq!(flesh.bucket(Bucket::Transition).len(), 1);
        assert_eq!(flesh.bucket(Bucket::TransitionImpassable).len(), 1);
        assert_eq!(flesh.bucket(Bucket::Gate).len(), 2);
        assert_eq!(flesh.bucket(Bucket::Obstacle).len(), 2);
        assert_eq!(flesh.bucket(Bucket::TrenchMiddle).len(), 1);
        // gate and passable obstacle names also match the plain passable prefix
        assert_eq!(flesh.tiles(TileWidth::One, NavType::Passable).len(), 2);

        let middle = flesh.segment("trench3_middle_a").unwrap();
        assert_eq!(middle.width, TileWidth::Three);
        assert_eq!(middle.nav, NavType::Tunnel);
    }

    #[test]
    fn test_collision_culling() {
        let front = Vec3::new(0.0, -1.0, 0.0);

        assert!(should_cull_polygon("tile1_impassable", &poly(Vec3::new(0.0, 0.0, 1.0), 0.0, 1.0)));
        assert!(should_cull_polygon("tile1_impassable", &poly(Vec3::new(0.0, 0.5, 0.0), 0.0, 1.0)));
        assert!(!should_cull_polygon("tile1_impassable", &poly(front, 0.0, 1.0)));

        // Flat tiles: only the band the ship flies in
        assert!(should_cull_polygon("tile1_impassable", &poly(front, 0.6, 2.0)));
        assert!(should_cull_polygon("tile1_impassable", &poly(front, -1.0, 0.0)));

        // Trench middle: only the trench floor band
        assert!(!should_cull_polygon("trench3_middle", &poly(front, -2.5, -1.0)));
        assert!(should_cull_polygon("trench3_middle", &poly(front, -1.5, -1.0)));
        assert!(should_cull_polygon("trench3_middle", &poly(front, -4.0, -3.0)));

        // Other trench tiles keep everything facing forward
        assert!(!should_cull_polygon("trench3_impassable", &poly(front, 3.0, 4.0)));
    }

    #[test]
    fn test_build_culls_shapes() {
        let catalog = TileCatalog::build(&SegmentLibrary::standard());
        let wall = catalog.level(Level::Steel).segment("tile1_impassable_a").unwrap();
        // wall kept, floor culled
        assert_eq!(wall.collision.len(), 1);
    }

    #[test]
    fn test_fallback_order() {
        let library = SegmentLibrary::new(vec![
            RawSegment::new("rift_tile1_passable_a"),
            RawSegment::new("rift_tile3_empty"),
        ]);
        let catalog = TileCatalog::build(&library);
        let mut rng = SeededRng::new(RunSeed::new(1));

        let pick = catalog.pick(&mut rng, Level::Rift, TileWidth::One, NavType::Tunnel);
        assert_eq!(pick.nav, NavType::Passable);

        let pick = catalog.pick(&mut rng, Level::Rift, TileWidth::Three, NavType::Impassable);
        assert_eq!(pick.nav, NavType::Empty);
        assert_eq!(pick.prototype.name, "tile3_empty");

        // Nothing at all for this level
        let pick = catalog.pick(&mut rng, Level::Steel, TileWidth::One, NavType::Impassable);
        assert_eq!(pick.nav, NavType::Passable);
        assert!(Arc::ptr_eq(&pick.prototype, catalog.placeholder()));
    }

    #[test]
    fn test_pick_bucket_falls_back() {
        let library = SegmentLibrary::new(vec![RawSegment::new("rift_tile3_impassable_a")]);
        let catalog = TileCatalog::build(&library);
        let mut rng = SeededRng::new(RunSeed::new(1));

        let pick = catalog.pick_bucket(&mut rng, Level::Rift, Bucket::TrenchImpassable, TileWidth::Three, NavType::Impassable);
        assert_eq!(pick.nav, NavType::Impassable);
        assert_eq!(pick.prototype.name, "tile3_impassable_a");
    }

    #[test]
    fn test_pick_nth_draws_nothing() {
        let catalog = TileCatalog::build(&SegmentLibrary::standard());
        let mut rng = SeededRng::new(RunSeed::new(5));
        let mut control = SeededRng::new(RunSeed::new(5));

        let pick = catalog.pick_nth(Level::Steel, TileWidth::One, NavType::Empty, 7);
        assert_eq!(pick.nav, NavType::Empty);
        assert_eq!(rng.range(0..100), control.range(0..100));
    }
}
