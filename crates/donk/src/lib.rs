//! # DONK
//!
//! Runtime shell around the procedural tube: fixed-timestep stepping,
//! the run session and the ship probe that collision, physics and music
//! collaborators read from.
//!
//! ## Example
//!
//! ```rust,ignore
//! use donk::{DonkConfig, RunSession};
//!
//! let mut session = RunSession::new(DonkConfig::default())?;
//! session.set_boost(true);
//! session.update(1.0 / 60.0);
//!
//! if let Some(sample) = session.probe().sample() {
//!     println!("floor {} below", sample.ground_radius);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod probe;
pub mod session;
pub mod step;

pub use config::{DonkConfig, StepConfig};
pub use error::{DonkError, DonkResult};
pub use probe::{ProbeSample, ShipProbe, SlotSample};
pub use session::{RunSession, TubeCollaborator, TubeView};
pub use step::{FixedStep, Substeps};
