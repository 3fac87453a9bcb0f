//! # DONK Core
//!
//! Engine-neutral building blocks shared by the tube generator and the
//! runtime:
//! - `SlotPool`: generational slot storage (the ring arena)
//! - `RunSeed` / `SeededRng`: the single deterministic random stream of a run
//! - `Vec2` / `Vec3`: the few vector types the tube needs
//!
//! ## Example
//!
//! ```rust,ignore
//! use donk_core::{RunSeed, SeededRng};
//!
//! let mut rng = SeededRng::new(RunSeed::new(2));
//! let width = rng.choose_copied(&[1u32, 3]).unwrap_or(1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod math;
pub mod memory;
pub mod rng;

pub use math::{Vec2, Vec3};
pub use memory::{PoolHandle, SlotPool};
pub use rng::{RunSeed, SeededRng};
