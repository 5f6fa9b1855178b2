//! Toolchain command construction and execution.
//!
//! A [`ToolCommand`] only describes what to run. Running it is a separate step
//! that honors a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and an optional per-step timeout.

pub mod command;
pub mod types;

pub use command::ToolCommand;
pub use types::{CommandError, CommandOutput};
