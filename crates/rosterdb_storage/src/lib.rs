//! # RosterDB Storage
//!
//! Line-oriented storage backends for RosterDB.
//!
//! A backend is an append-only sequence of newline-terminated lines. It
//! knows nothing about records or indexes: it hands out the byte offset a
//! line starts at, reads one line back from such an offset, and scans every
//! line in file order. RosterDB owns all interpretation of line contents.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A single text file, opened and closed per call
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use rosterdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let first = backend.append_line(b"hello").unwrap();
//! let second = backend.append_line(b"world").unwrap();
//! assert_eq!(second, 6);
//! assert_eq!(backend.read_line_at(first).unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod lines;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use lines::{Line, LineIter};
pub use memory::InMemoryBackend;
