//! Persisted build state: which outputs were produced from which inputs.

mod store;
mod types;

pub use store::StateStore;
pub use types::*;
