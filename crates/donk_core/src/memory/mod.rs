//! # Memory Management
//!
//! Slot storage for objects with churny, out-of-order lifetimes.
//!
//! ## Design Philosophy
//!
//! Objects are addressed by small copyable handles, never by pointers:
//! - Freeing is a free-list push
//! - Stale handles are detected by generation, not trusted
//! - Ownership stays with the pool's owner

mod pool;

pub use pool::{PoolHandle, SlotPool};
