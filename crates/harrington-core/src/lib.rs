//! harrington-core: fuzzy membership, valuation, and potential scoring.
//!
//! A project's rank on a characteristic is evaluated against the trapezoidal
//! terms configured for that characteristic in an ecosystem. The dominant
//! term's index then feeds the membership functions of every potential the
//! characteristic is weighted toward, and each potential's weighted profile
//! collapses to one score.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod membership;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod traits;
pub mod valuation;

#[cfg(test)]
mod testing;

pub use error::ScoringError;
pub use traits::RelationSource;
