//! Host platform detection.
//!
//! Only the CPU architecture matters to the engine: it decides which package
//! layouts a toolchain can link against.

pub mod arch;

pub use arch::{Arch, host_arch};
