//! # Segment Library
//!
//! The static list of segment prototypes as it comes out of the art
//! pipeline: a name that encodes level, width and navigability, plus the
//! collision polygons exported with the tile. The tile's geometry handle is
//! its position in the library.
//!
//! Manifests are TOML:
//!
//! ```toml
//! [[segment]]
//! name = "steel_tile1_impassable_crate"
//!
//! [[segment.collision]]
//! normal = { x = 0.0, y = -1.0, z = 0.0 }
//! points = [{ x = 0.0, y = 0.0, z = 0.0 }, { x = 2.0, y = 0.0, z = 1.5 }]
//! ```

use std::path::Path;

use donk_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{TubeError, TubeResult};
use crate::nav::Level;

/// A collision polygon as exported: face normal plus vertices.
///
/// Tile-local axes: `y` points along the travel axis, `z` points up away
/// from the tube wall (negative `z` is below the wall surface).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPolygon {
    /// Face normal.
    pub normal: Vec3,
    /// Vertices.
    pub points: Vec<Vec3>,
}

impl RawPolygon {
    /// Lowest and highest vertex along `z`, or None without vertices.
    #[must_use]
    pub fn z_extent(&self) -> Option<(f32, f32)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.z, p.z)),
            Some((lo, hi)) => Some((lo.min(p.z), hi.max(p.z))),
        })
    }
}

/// One named segment prototype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    /// Name, `<level>_<kind>_<variant>`.
    pub name: String,
    /// Collision polygons, possibly none.
    #[serde(default)]
    pub collision: Vec<RawPolygon>,
}

impl RawSegment {
    /// A segment without collision.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collision: Vec::new(),
        }
    }

    /// Adds a collision polygon.
    #[must_use]
    pub fn with_polygon(mut self, polygon: RawPolygon) -> Self {
        self.collision.push(polygon);
        self
    }
}

/// Ordered list of segment prototypes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentLibrary {
    #[serde(rename = "segment", default)]
    segments: Vec<RawSegment>,
}

impl SegmentLibrary {
    /// Creates a library from segments in handle order.
    #[must_use]
    pub fn new(segments: Vec<RawSegment>) -> Self {
        Self { segments }
    }

    /// Parses a TOML manifest.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::Parse` for malformed manifests.
    pub fn from_toml_str(text: &str) -> TubeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a TOML manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::Io` if the file cannot be read, `TubeError::Parse`
    /// if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> TubeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TubeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: RawSegment) {
        self.segments.push(segment);
    }

    /// Segments in handle order.
    #[must_use]
    pub fn segments(&self) -> &[RawSegment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if the library holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The stock segment set for all three levels.
    ///
    /// Mirrors the shipped art: a handful of variants per kind, a few
    /// legacy misspelled names, and a wall face plus a floor face per solid
    /// tile so collision culling has something to discard.
    #[must_use]
    pub fn standard() -> Self {
        let mut library = Self::default();

        for level in Level::ALL {
            let p = level.name();
            library.push(RawSegment::new(format!("{p}_tile1_empty")));
            library.push(RawSegment::new(format!("{p}_tile1_passable_a")));
            library.push(RawSegment::new(format!("{p}_tile1_passable_b")));
            library.push(solid(format!("{p}_tile1_impassable_a"), 0.0, 1.5));
            library.push(solid(format!("{p}_tile1_swervible_a"), 0.0, 0.4));
            library.push(RawSegment::new(format!("{p}_tile3_empty")));
            library.push(RawSegment::new(format!("{p}_tile3_passable_a")));
            library.push(solid(format!("{p}_tile3_impassable_a"), 0.0, 1.5));
            library.push(solid(format!("{p}_tile3_swervible_a"), 0.0, 0.4));
        }

        // Steel: tunnels, trenches and the legacy asset names.
        library.push(solid("steel_tile1_impasssable_b".into(), 0.0, 2.0));
        library.push(solid("steel_tile1_passable_tunnel_a".into(), 1.2, 2.0));
        library.push(solid("steel_tile3_passable_tunnel_a".into(), 1.2, 2.0));
        library.push(solid("steel_tile3_swirvible_b".into(), 0.0, 0.4));
        library.push(RawSegment::new("steel_trench3_entrance_a"));
        library.push(solid("steel_trench3_middle_a".into(), -2.5, -1.0));
        library.push(RawSegment::new("steel_trench3_end_a"));
        library.push(solid("steel_trench3_impassable_a".into(), -2.5, 1.5));

        // Flesh: transition, gate and obstacle tiles, trenches.
        library.push(RawSegment::new("flesh_tile1_transition"));
        library.push(solid("flesh_tile1_transition_impassable".into(), 0.0, 1.5));
        library.push(RawSegment::new("flesh_tile1_passable_gate_a"));
        library.push(solid("flesh_tile1_passable_obstacle_a".into(), 0.0, 0.8));
        library.push(solid("flesh_tile1_obstacle_tooth".into(), 0.0, 1.0));
        library.push(RawSegment::new("flesh_trench3_entrance_a"));
        library.push(solid("flesh_trench3_middle_a".into(), -2.5, -1.0));
        library.push(solid("flesh_trench3_impassable_a".into(), -2.5, 1.5));

        library
    }
}

/// A tile with one front-facing wall spanning `[low, high]` and one floor
/// face that collision culling removes.
fn solid(name: String, low: f32, high: f32) -> RawSegment {
    let wall = RawPolygon {
        normal: Vec3::new(0.0, -1.0, 0.0),
        points: vec![
            Vec3::new(0.0, 0.0, low),
            Vec3::new(2.0, 0.0, low),
            Vec3::new(2.0, 0.0, high),
            Vec3::new(0.0, 0.0, high),
        ],
    };
    let floor = RawPolygon {
        normal: Vec3::new(0.0, 0.0, 1.0),
        points: vec![
            Vec3::new(0.0, 0.0, high),
            Vec3::new(2.0, 0.0, high),
            Vec3::new(2.0, 2.0, high),
        ],
    };
    RawSegment::new(name).with_polygon(wall).with_polygon(floor)
}
