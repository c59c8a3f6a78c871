//! The five deduplicating tables plus the write-data cache (§3). Each
//! table owns one section's in-memory shape; `toc.rs` is the only other
//! module that knows how they serialise to bytes.

pub mod cache;
pub mod fields;
pub mod fieldsets;
pub mod paths;
pub mod specs;
pub mod tokens;

pub use cache::{CacheKey, Fingerprint, WriteDataCache};
pub use fields::FieldTable;
pub use fieldsets::FieldSetTable;
pub use paths::PathTable;
pub use specs::SpecTable;
pub use tokens::TokenTable;
