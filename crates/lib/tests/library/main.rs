//! Library integration tests for plugforge-lib.

#![cfg(unix)]

mod build_tests;
mod common;
