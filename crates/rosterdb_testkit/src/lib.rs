//! # RosterDB Testkit
//!
//! Test utilities for RosterDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A model-checking harness that mirrors every operation in a plain map
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rosterdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|db| {
//!         db.add(Record::new(1, "Ada", 3.9, true)).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use rosterdb_core::{Database, Record};
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
