//! In-memory indexes over the record store.
//!
//! All indexes are derived state: they are rebuilt from the store by the
//! loader and never persisted on their own.
//!
//! # Index Types
//!
//! - [`HashIndex`]: key to set-of-ids bucket index, used for the name,
//!   score and active attributes
//! - [`IndexEngine`]: owns the primary id-to-offset map, the three bucket
//!   indexes and the summary cache, and keeps them in lock-step

mod engine;
mod hash;

pub use engine::{EditPolicy, IndexCounts, IndexEngine, IndexSnapshot};
pub use hash::HashIndex;
