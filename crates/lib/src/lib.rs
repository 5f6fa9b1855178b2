//! plugforge-lib: custom builds of a Go host application with plugins.
//!
//! This crate provides the build-environment orchestrator:
//! - `build`: the `Builder` configuration and the end-to-end build
//! - `workspace`: ephemeral, exclusively owned module workspaces
//! - `execute`: toolchain commands with cancellation and timeouts
//! - `env`: environment snapshots and pure overlays
//! - `gomod`: plugin dependencies and replace directives

pub mod build;
pub mod consts;
pub mod env;
pub mod execute;
pub mod gomod;
pub mod platform;
pub mod util;
pub mod workspace;

pub use build::{BuildError, BuildReport, Builder};
pub use tokio_util::sync::CancellationToken;
