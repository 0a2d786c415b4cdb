//! CLI command implementations.

pub mod backup;
pub mod compact;
pub mod import;
pub mod inspect;
pub mod record;
