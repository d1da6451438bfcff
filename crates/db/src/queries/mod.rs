// crates/db/src/queries/mod.rs
// Query methods on `Database`, one module per table family.

mod domain_performance;
mod records;
pub(crate) mod row_types;
mod sessions;

pub use records::{Record, MAX_RECORDS};
pub use sessions::MAX_RECENT_SESSIONS;
