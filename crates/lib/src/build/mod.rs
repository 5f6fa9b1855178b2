//! Custom builds of the host application.
//!
//! A [`Builder`] describes one build: the host version, the plugins to
//! compile in, module replacements, target platform and toolchain flags.
//! [`Builder::build`] runs it start to finish:
//!
//! 1. Validate the output path and flags (no side effects on failure)
//! 2. Create a [`Workspace`](crate::workspace::Workspace) and initialize its module
//! 3. `go mod tidy` under the dependency timeout
//! 4. `go build` under the compile timeout, with the target environment overlaid
//! 5. Tear the workspace down, unless cleanup is skipped
//!
//! # Submodules
//!
//! - [`execute`] - Orchestration of the steps above
//! - [`types`] - Configuration, report and error types

pub mod execute;
mod types;

pub use execute::compile_args;
pub use types::*;
