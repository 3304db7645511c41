//! Storage module
//!
//! Contains the shared in-memory key-value store and its snapshot rendering.

mod memory;

pub use memory::{KvStore, SNAPSHOT_LIMIT};
