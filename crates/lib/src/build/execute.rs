//! Build orchestration: validate, prepare the workspace, tidy, compile,
//! tear down.

use std::ffi::OsString;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::types::{BuildError, BuildReport, Builder};
use crate::env::{EnvSnapshot, overlay_all};
use crate::consts::{DEFAULT_HOST_MAJOR, DEFAULT_HOST_MODULE};
use crate::gomod::{major_version, versioned_module_path};
use crate::platform::Compile;
use crate::workspace::{Workspace, WorkspaceSettings};

/// `go build` flags used when none are configured.
const DEFAULT_BUILD_FLAGS: &[&str] = &["-ldflags", "-w -s", "-trimpath"];

/// Debug builds keep symbol tables so a debugger can attach.
const DEFAULT_DEBUG_BUILD_FLAGS: &[&str] = &["-trimpath"];

fn split_flags(kind: &'static str, raw: Option<&str>) -> Result<Option<Vec<String>>, BuildError> {
  raw
    .map(|flags| {
      shell_words::split(flags).map_err(|source| BuildError::InvalidFlags {
        kind,
        flags: flags.to_string(),
        source,
      })
    })
    .transpose()
}

/// Arguments the orchestrator appends to `go build` after the configured
/// build flags. The output path is passed through as-is, whatever its
/// encoding.
pub fn compile_args(debug: bool, race_detector: bool, output: &Path) -> Vec<OsString> {
  let mut args: Vec<OsString> = Vec::new();
  if debug {
    args.push("-gcflags".into());
    args.push("all=-N -l".into());
  }
  if race_detector {
    args.push("-race".into());
  }
  args.push("-o".into());
  args.push(output.as_os_str().to_os_string());
  args
}

/// Import path of the host module for `version`.
///
/// The default host module is configured without its `/vN` suffix. When the
/// version does not name a major version (unset, a branch or a commit), it
/// resolves to the current major line.
pub fn host_module_path(module: &str, version: Option<&str>) -> String {
  let has_major = version.and_then(major_version).is_some();
  if module == DEFAULT_HOST_MODULE && !has_major {
    return format!("{}/v{}", module, DEFAULT_HOST_MAJOR);
  }
  versioned_module_path(module, version)
}

impl Builder {
  /// Build the host application with the configured plugins and write the
  /// binary to `output_file`.
  ///
  /// The ambient process environment is captured once here and used both as
  /// the base environment for the toolchain and for target-platform defaults.
  pub async fn build(
    &self,
    cancel: &CancellationToken,
    output_file: impl AsRef<Path>,
  ) -> Result<BuildReport, BuildError> {
    self.build_with_env(cancel, output_file, &EnvSnapshot::capture()).await
  }

  /// Like [`build`](Self::build), but against an explicit environment.
  pub async fn build_with_env(
    &self,
    cancel: &CancellationToken,
    output_file: impl AsRef<Path>,
    env: &EnvSnapshot,
  ) -> Result<BuildReport, BuildError> {
    let output_file = output_file.as_ref();
    if output_file.as_os_str().is_empty() {
      return Err(BuildError::MissingOutputPath);
    }

    // `go build` runs inside the workspace, so a relative path would land there.
    let abs_output = std::path::absolute(output_file).map_err(|source| BuildError::OutputPath {
      path: output_file.to_path_buf(),
      source,
    })?;

    let settings = self.workspace_settings(env)?;
    let workspace = Workspace::create(&settings, cancel).await?;

    let result = self.run_steps(&workspace, cancel, &abs_output, env).await;
    let cleanup = workspace.close();

    match (result, cleanup) {
      (Ok(report), Ok(())) => Ok(report),
      (Ok(mut report), Err(cleanup_err)) => {
        warn!(error = %cleanup_err, "build succeeded but workspace cleanup failed");
        report.cleanup_error = Some(cleanup_err);
        Ok(report)
      }
      (Err(err), Ok(())) => Err(err),
      (Err(err), Err(cleanup_err)) => {
        warn!(error = %cleanup_err, "workspace cleanup failed after build error");
        Err(err)
      }
    }
  }

  fn workspace_settings(&self, env: &EnvSnapshot) -> Result<WorkspaceSettings, BuildError> {
    let build_flags = match split_flags("build", self.build_flags.as_deref())? {
      Some(flags) => flags,
      None if self.debug => DEFAULT_DEBUG_BUILD_FLAGS.iter().map(|s| s.to_string()).collect(),
      None => DEFAULT_BUILD_FLAGS.iter().map(|s| s.to_string()).collect(),
    };
    let mod_flags = split_flags("mod", self.mod_flags.as_deref())?.unwrap_or_default();

    Ok(WorkspaceSettings {
      go_binary: self.go_binary.clone(),
      host_module: host_module_path(&self.host_module, self.host_version.as_deref()),
      host_version: self.host_version.clone(),
      plugins: self.plugins.clone(),
      replacements: self.replacements.clone(),
      parent_dir: self.workspace_parent.clone(),
      skip_cleanup: self.skip_cleanup,
      env: env.entries().to_vec(),
      build_flags,
      mod_flags,
    })
  }

  /// Effective compile settings and whether cgo had to be forced on.
  pub fn effective_compile(&self, env: &EnvSnapshot) -> (Compile, bool) {
    let mut compile = self.compile.with_env_defaults(env);
    let forced = self.race_detector && !compile.cgo_enabled();
    if forced {
      compile.cgo = Some(true);
    }
    (compile, forced)
  }

  async fn run_steps(
    &self,
    workspace: &Workspace,
    cancel: &CancellationToken,
    abs_output: &Path,
    env: &EnvSnapshot,
  ) -> Result<BuildReport, BuildError> {
    let mut report = BuildReport {
      output: abs_output.to_path_buf(),
      workspace: workspace.path().to_path_buf(),
      compiled: false,
      compile: self.compile.with_env_defaults(env),
      cgo_forced: false,
      cleanup_error: None,
    };

    if self.skip_build {
      info!("skipping build as requested");
      return Ok(report);
    }

    let (compile, cgo_forced) = self.effective_compile(env);
    if cgo_forced {
      warn!("enabling cgo because it is required by the race detector");
    }
    let compile_env = overlay_all(env.entries(), compile.env_overrides());

    info!(target = %compile.target_label(), "building");

    workspace
      .tidy_command()
      .run(cancel, self.timeout_get)
      .await
      .map_err(BuildError::DependencyResolution)?;

    let existed = abs_output.exists();
    let cmd = workspace
      .build_command(["build"])
      .args(compile_args(self.debug, self.race_detector, abs_output))
      .env_list(compile_env);

    if let Err(err) = cmd.run(cancel, self.timeout_build).await {
      if !existed && abs_output.exists() {
        if let Err(remove_err) = std::fs::remove_file(abs_output) {
          warn!(path = %abs_output.display(), error = %remove_err, "failed to remove incomplete output");
        }
      }
      return Err(BuildError::Compile(err));
    }

    info!(output = %abs_output.display(), "build complete");

    report.compiled = true;
    report.compile = compile;
    report.cgo_forced = cgo_forced;
    Ok(report)
  }
}
