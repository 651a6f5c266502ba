//! Discovery of already-installed third-party packages.
//!
//! A [`Package`] is the include/library/runtime file set of one dependency as
//! seen by one toolchain. How the filesystem is searched is up to the
//! toolchain (see [`Toolchain::describe_package`](crate::toolchain::Toolchain::describe_package));
//! this module provides the shared probing helpers and the caching
//! [`PackageResolver`].
//!
//! # Submodules
//!
//! - [`layout`] - Candidate directory discovery and file listing
//! - [`resolve`] - Per-backend resolution cache

pub mod layout;
pub mod resolve;
mod types;

pub use resolve::{PackageResolver, package_roots_from_env};
pub use types::*;
