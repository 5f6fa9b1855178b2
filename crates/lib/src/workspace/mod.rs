//! Ephemeral build workspaces.
//!
//! A workspace is a fresh temporary directory holding the generated
//! `main.go` and the `go.mod` that pins the host module, declares plugins and
//! carries the replace directives. It lives for exactly one build and is
//! removed afterwards unless cleanup is skipped.

pub mod main_go;
pub mod parent;
pub mod types;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consts::{WORKSPACE_MODULE_NAME, WORKSPACE_PREFIX, WORKSPACE_TIMESTAMP_FORMAT};
use crate::env::EnvVar;
use crate::execute::ToolCommand;
use crate::gomod::Dependency;
use crate::platform::HostOs;

pub use parent::{resolve_parent_dir, workspace_parent_dir};
pub use types::{WorkspaceError, WorkspaceSettings};

/// Directory name prefix for a workspace created at `now`. The temp-dir
/// primitive appends a unique suffix.
pub fn workspace_prefix(now: DateTime<Local>) -> String {
  format!("{}{}.", WORKSPACE_PREFIX, now.format(WORKSPACE_TIMESTAMP_FORMAT))
}

fn new_temp_folder(parent: Option<&Path>) -> Result<TempDir, WorkspaceError> {
  let prefix = workspace_prefix(Local::now());
  let mut builder = tempfile::Builder::new();
  builder.prefix(&prefix);
  let dir = match parent {
    Some(parent) => builder.tempdir_in(parent),
    None => builder.tempdir(),
  };
  dir.map_err(|source| WorkspaceError::CreateDir {
    parent: parent.map(Path::to_path_buf),
    source,
  })
}

/// An exclusively owned build directory.
///
/// Call [`close`](Workspace::close) to remove it and observe removal errors.
/// Dropping an unclosed workspace applies the same cleanup policy but
/// ignores errors.
#[derive(Debug)]
pub struct Workspace {
  dir: Option<TempDir>,
  path: PathBuf,
  go_binary: PathBuf,
  env: Vec<EnvVar>,
  build_flags: Vec<String>,
  mod_flags: Vec<String>,
  skip_cleanup: bool,
}

impl Workspace {
  /// Create the directory and initialize the module inside it.
  ///
  /// On failure the partially prepared directory is torn down before the
  /// error is returned.
  pub async fn create(settings: &WorkspaceSettings, cancel: &CancellationToken) -> Result<Self, WorkspaceError> {
    let parent =
      resolve_parent_dir(settings.parent_dir.as_ref(), HostOs::current()).map_err(WorkspaceError::ParentDir)?;
    let dir = new_temp_folder(parent.as_deref())?;
    let path = dir.path().to_path_buf();
    info!(path = %path.display(), "created workspace");

    let workspace = Self {
      dir: Some(dir),
      path,
      go_binary: settings.go_binary.clone(),
      env: settings.env.clone(),
      build_flags: settings.build_flags.clone(),
      mod_flags: settings.mod_flags.clone(),
      skip_cleanup: settings.skip_cleanup,
    };

    if let Err(err) = workspace.initialize(settings, cancel).await {
      if let Err(close_err) = workspace.close() {
        warn!(error = %close_err, "failed to clean up workspace after setup error");
      }
      return Err(err);
    }

    Ok(workspace)
  }

  async fn initialize(&self, settings: &WorkspaceSettings, cancel: &CancellationToken) -> Result<(), WorkspaceError> {
    let main_path = self.path.join("main.go");
    let source = main_go::render_main_go(&settings.host_module, &settings.plugins);
    debug!(path = %main_path.display(), "writing main.go");
    std::fs::write(&main_path, source).map_err(|source| WorkspaceError::WriteFile {
      path: main_path.clone(),
      source,
    })?;

    info!("initializing Go module");
    self
      .mod_command(["init", WORKSPACE_MODULE_NAME])
      .run(cancel, None)
      .await
      .map_err(WorkspaceError::Init)?;

    let host = Dependency::new(settings.host_module.clone(), settings.host_version.clone());
    for dep in std::iter::once(&host).chain(settings.plugins.iter()) {
      let Some(param) = dep.require_param() else {
        debug!(module = %dep.package_path, "no version pinned; left to tidy");
        continue;
      };
      info!(module = %param, "pinning requirement");
      self
        .mod_command(["edit".to_string(), format!("-require={}", param)])
        .run(cancel, None)
        .await
        .map_err(|source| WorkspaceError::Require { module: param, source })?;
    }

    for replace in &settings.replacements {
      let param = replace.param();
      info!(old = %replace.old, new = %replace.new, "applying replacement");
      self
        .mod_command(["edit".to_string(), "-replace".to_string(), param.clone()])
        .run(cancel, None)
        .await
        .map_err(|source| WorkspaceError::Replace { replace: param, source })?;
    }

    Ok(())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// A `go mod <args>` command scoped to this workspace.
  pub fn mod_command<I, S>(&self, args: I) -> ToolCommand
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    ToolCommand::new(&self.go_binary)
      .arg("mod")
      .args(args)
      .current_dir(&self.path)
      .env_list(self.env.clone())
  }

  /// `go mod tidy -e` plus the configured mod flags.
  pub fn tidy_command(&self) -> ToolCommand {
    self.mod_command(["tidy", "-e"]).args(self.mod_flags.iter().cloned())
  }

  /// A `go <args>` command followed by the configured build flags.
  pub fn build_command<I, S>(&self, args: I) -> ToolCommand
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    ToolCommand::new(&self.go_binary)
      .args(args)
      .args(self.build_flags.iter().cloned())
      .current_dir(&self.path)
      .env_list(self.env.clone())
  }

  /// Tear the workspace down according to its cleanup policy.
  pub fn close(mut self) -> Result<(), WorkspaceError> {
    let Some(dir) = self.dir.take() else {
      return Ok(());
    };

    if self.skip_cleanup {
      let path = dir.keep();
      info!(path = %path.display(), "skipping cleanup as requested; workspace left on disk");
      return Ok(());
    }

    info!(path = %self.path.display(), "cleaning up workspace");
    dir.close().map_err(|source| WorkspaceError::Remove {
      path: self.path.clone(),
      source,
    })
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    if let Some(dir) = self.dir.take() {
      if self.skip_cleanup {
        let _ = dir.keep();
      }
    }
  }
}
