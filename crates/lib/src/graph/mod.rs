//! Build graph declaration and planning.
//!
//! Declaring targets is pure data ([`BuildGraph`]); [`plan`] is the separate
//! pass that turns those declarations into concrete actions for one toolchain.

mod builder;
pub mod plan;
mod types;

pub use builder::{BuildGraph, NamespaceOwner, NamespaceScope};
pub use plan::plan;
pub use types::*;
