use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_GO_BINARY, DEFAULT_HOST_MODULE};
use crate::execute::CommandError;
use crate::gomod::{Dependency, Replace};
use crate::platform::Compile;
use crate::workspace::WorkspaceError;

/// A custom build of the host application.
///
/// The value is read-only input to [`Builder::build`]; nothing in it is
/// mutated by a build. Serializes to the JSON accepted by `--config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Builder {
  /// Version of the host module to pin. `None` takes the latest.
  #[serde(rename = "caddy_version", skip_serializing_if = "Option::is_none")]
  pub host_version: Option<String>,

  /// Import path of the host module.
  pub host_module: String,

  pub plugins: Vec<Dependency>,

  /// Applied with `go mod edit -replace` in this order.
  pub replacements: Vec<Replace>,

  /// Bound on dependency resolution (`go mod tidy`).
  #[serde(with = "crate::util::duration", skip_serializing_if = "Option::is_none")]
  pub timeout_get: Option<Duration>,

  /// Bound on `go build`.
  #[serde(with = "crate::util::duration", skip_serializing_if = "Option::is_none")]
  pub timeout_build: Option<Duration>,

  pub race_detector: bool,
  pub skip_cleanup: bool,
  pub skip_build: bool,
  pub debug: bool,

  /// Raw extra `go build` flags. `None` selects the default flags.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build_flags: Option<String>,

  /// Raw extra `go mod tidy` flags.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mod_flags: Option<String>,

  pub compile: Compile,

  pub go_binary: PathBuf,

  /// Where workspaces are created, instead of the per-platform default.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workspace_parent: Option<PathBuf>,
}

impl Default for Builder {
  fn default() -> Self {
    Self {
      host_version: None,
      host_module: DEFAULT_HOST_MODULE.to_string(),
      plugins: Vec::new(),
      replacements: Vec::new(),
      timeout_get: None,
      timeout_build: None,
      race_detector: false,
      skip_cleanup: false,
      skip_build: false,
      debug: false,
      build_flags: None,
      mod_flags: None,
      compile: Compile::default(),
      go_binary: PathBuf::from(DEFAULT_GO_BINARY),
      workspace_parent: None,
    }
  }
}

/// What a build did.
#[derive(Debug)]
pub struct BuildReport {
  /// Absolute path the binary was written to.
  pub output: PathBuf,

  /// Workspace directory used for this build. Only still on disk when
  /// cleanup was skipped.
  pub workspace: PathBuf,

  /// False when the compile step was skipped.
  pub compiled: bool,

  /// Effective compile settings after environment defaults and the race
  /// detector adjustment.
  pub compile: Compile,

  /// Cgo was turned on because the race detector needs it.
  pub cgo_forced: bool,

  /// Removing the workspace failed after an otherwise successful build.
  pub cleanup_error: Option<WorkspaceError>,
}

/// Errors from [`Builder::build`].
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("output file path is required")]
  MissingOutputPath,

  #[error("cannot resolve output path {path}")]
  OutputPath {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid {kind} flags {flags:?}")]
  InvalidFlags {
    kind: &'static str,
    flags: String,
    #[source]
    source: shell_words::ParseError,
  },

  #[error("workspace setup failed")]
  Workspace(#[from] WorkspaceError),

  #[error("dependency resolution failed")]
  DependencyResolution(#[source] CommandError),

  #[error("compile failed")]
  Compile(#[source] CommandError),
}

impl BuildError {
  /// The toolchain command failure behind this error, if any.
  pub fn command_error(&self) -> Option<&CommandError> {
    match self {
      BuildError::Workspace(err) => err.command_error(),
      BuildError::DependencyResolution(err) | BuildError::Compile(err) => Some(err),
      _ => None,
    }
  }

  /// True when a toolchain step (tidy or compile) failed, as opposed to
  /// validation or workspace setup.
  pub fn is_toolchain_failure(&self) -> bool {
    matches!(self, BuildError::DependencyResolution(_) | BuildError::Compile(_))
  }

  /// Captured toolchain output worth showing verbatim.
  pub fn diagnostics(&self) -> Option<&str> {
    self.command_error().and_then(CommandError::output)
  }

  /// True when the build stopped because of cancellation or a timeout.
  pub fn is_interrupted(&self) -> bool {
    self.command_error().is_some_and(CommandError::is_interrupted)
  }
}
