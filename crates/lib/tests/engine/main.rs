//! End-to-end tests for the build engine.
//!
//! Backends use the GCC driver with `program` pointed at a shell script that
//! stands in for `g++`, so these run anywhere `/bin/sh` does.

#![cfg(unix)]

mod build_tests;
mod common;
mod manifest_tests;
mod staging_tests;
