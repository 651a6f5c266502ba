//! CLI integration tests. Each test builds a small project in a temp
//! directory with a shell script standing in for the compiler.

#![cfg(unix)]

mod build_tests;
mod clean_tests;
mod common;
mod plan_tests;
