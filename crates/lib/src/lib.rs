//! kiln-lib: an incremental build engine for native code.
//!
//! This crate provides the engine behind the `kiln` CLI:
//! - `toolchain`: compiler/linker flavors behind one capability trait
//! - `registry`: registered backends, exactly one active
//! - `package`: per-toolchain discovery of installed packages, cached
//! - `graph`: namespaced target declarations and planning into actions
//! - `execute`: staleness checks and dependency-ordered parallel execution
//! - `session`: the owned API tying the above together

pub mod action;
pub mod consts;
pub mod execute;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod platform;
pub mod registry;
pub mod session;
pub mod state;
pub mod toolchain;
pub mod util;

pub use session::{BuildError, Session};
