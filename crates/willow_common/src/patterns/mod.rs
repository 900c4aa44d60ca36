//! Message pattern store.
//!
//! Persisted memory of previously classified messages plus the question bank.
//! Every external-classifier fallback writes its result here, so repeated
//! messages resolve locally on the next encounter.
//!
//! Schema version: 1

pub mod schema;
pub mod store;

pub use schema::*;
pub use store::*;
