// crates/core/src/lib.rs
pub mod aggregation;
pub mod arena;
pub mod error;
pub mod period;
pub mod rounds;
pub mod stats;
pub mod tables;
pub mod types;

pub use aggregation::*;
pub use arena::*;
pub use error::*;
pub use period::*;
pub use rounds::*;
pub use tables::*;
pub use types::*;
