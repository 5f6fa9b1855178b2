use std::path::PathBuf;

use thiserror::Error;

use crate::env::EnvVar;
use crate::execute::CommandError;
use crate::gomod::{Dependency, Replace};

/// Everything needed to set up one workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
  /// The `go` program to invoke.
  pub go_binary: PathBuf,
  /// Host module import path, already carrying its major-version suffix.
  pub host_module: String,
  pub host_version: Option<String>,
  pub plugins: Vec<Dependency>,
  pub replacements: Vec<Replace>,
  /// Overrides the platform policy for the workspace parent directory.
  pub parent_dir: Option<PathBuf>,
  pub skip_cleanup: bool,
  /// Base environment for every command run in the workspace.
  pub env: Vec<EnvVar>,
  /// Extra arguments appended to `go build`.
  pub build_flags: Vec<String>,
  /// Extra arguments appended to `go mod tidy`.
  pub mod_flags: Vec<String>,
}

/// Errors from creating, preparing or removing a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("cannot determine workspace parent directory")]
  ParentDir(#[source] std::io::Error),

  #[error("failed to create workspace directory")]
  CreateDir {
    parent: Option<PathBuf>,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}")]
  WriteFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("module initialization failed")]
  Init(#[source] CommandError),

  #[error("failed to require {module}")]
  Require {
    module: String,
    #[source]
    source: CommandError,
  },

  #[error("failed to apply replacement {replace}")]
  Replace {
    replace: String,
    #[source]
    source: CommandError,
  },

  #[error("failed to remove workspace {path}")]
  Remove {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl WorkspaceError {
  /// The toolchain failure behind this error, if a command caused it.
  pub fn command_error(&self) -> Option<&CommandError> {
    match self {
      WorkspaceError::Init(source)
      | WorkspaceError::Require { source, .. }
      | WorkspaceError::Replace { source, .. } => Some(source),
      _ => None,
    }
  }
}
