//! Willow Common - Shared types and storage for the Willow screening engine.
//!
//! Vocabulary types (classifications, questions, answers, findings), the
//! concern-category registry, and the SQLite-backed message pattern store.

pub mod categories;
pub mod patterns;
pub mod types;

pub use categories::*;
pub use patterns::*;
pub use types::*;
