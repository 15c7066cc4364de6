//! harrington-store: the relation store behind the scoring engine.
//!
//! [`MemoryStore`] holds every entity of a snapshot, rejects rows that break
//! uniqueness or reference rules, and answers the queries of
//! [`harrington_core::RelationSource`].

pub mod config;
pub mod error;
pub mod memory;

pub use config::{load_config, load_config_from, open_store, HarringtonConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
