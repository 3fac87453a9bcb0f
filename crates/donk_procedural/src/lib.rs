//! # DONK Procedural Tube
//!
//! An endless, seeded tube of rings that always leaves the ship a way
//! through.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same tube
//! 2. **Traversable**: Every exit of a ring stays reachable in the next
//! 3. **Streamed**: One ring pulled per tick, rings behind the player freed
//! 4. **Forgiving**: Missing tiles degrade to passable ones, never to errors
//!
//! ## Core Components
//!
//! - `SegmentLibrary` / `TileCatalog`: segment prototypes sorted by level,
//!   width and navigability
//! - `solve`: the navigability solver
//! - `Planner` / `LevelScript`: level scripts played one ring at a time
//! - `TubeGenerator`: places drafted rings
//! - `TubeManager`: the live ring window
//!
//! ## Example
//!
//! ```rust,ignore
//! use donk_procedural::{TubeConfig, TubeManager};
//!
//! let mut tube = TubeManager::with_standard_library(TubeConfig::production())?;
//! tube.advance(0.2);
//!
//! let ring = tube.current_ring();
//! let ground = ring.radius_at(0.0) - ring.depth_at(0.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod library;
pub mod nav;
pub mod planner;
pub mod ring;
pub mod solver;
pub mod tube;

pub use builder::{Placement, RingBuilder, RingDraft};
pub use catalog::{Bucket, Pick, SegmentPrototype, TileCatalog, TileSet};
pub use config::TubeConfig;
pub use error::{TubeError, TubeResult};
pub use generator::{Generated, TubeGenerator};
pub use library::{RawPolygon, RawSegment, SegmentLibrary};
pub use nav::{Level, NavTable, NavType, TileWidth};
pub use planner::{LevelScript, PlanContext, PlannedRing, Planner, SegmentTarget, Step};
pub use ring::{Branch, BranchId, Ring, RingSlot};
pub use solver::{is_reachable, remap_exits, solve, Exit, ExitRemap, SolveFlags};
pub use tube::{TubeManager, TubeStats};
