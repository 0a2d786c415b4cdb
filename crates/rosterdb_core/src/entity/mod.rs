//! Record types and their line encoding.

mod record;
mod score;

pub use record::{Record, RecordId, Summary};
pub use score::Score;
