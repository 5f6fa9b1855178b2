//! Implementation of the `plugforge build` command.
//!
//! Turns command-line arguments, environment variables and an optional JSON
//! config file into a [`Builder`], runs it and reports the result.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use clap::builder::FalseyValueParser;
use tracing::warn;

use plugforge_lib::gomod::{ReplacementPath, parse_plugin_arg, parse_replace_arg};
use plugforge_lib::{Builder, CancellationToken};

use crate::output::{format_duration, print_diagnostics, print_info, print_stat, print_success, print_warning};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Host version to build (tag, branch or commit); defaults to the latest
  #[arg(env = "CADDY_VERSION")]
  pub version: Option<String>,

  /// Where to write the binary
  #[arg(short, long, value_name = "PATH")]
  pub output: Option<PathBuf>,

  /// Plugin to compile in, optionally pinned and/or replaced
  #[arg(long = "with", value_name = "MODULE[@VERSION][=REPLACEMENT]")]
  pub with: Vec<String>,

  /// Extra module replacement
  #[arg(long = "replace", value_name = "OLD=NEW")]
  pub replace: Vec<String>,

  /// JSON build configuration; command-line values are applied on top
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Build with the race detector (enables cgo)
  #[arg(long, env = "PLUGFORGE_RACE_DETECTOR", value_parser = FalseyValueParser::new())]
  pub race: bool,

  /// Disable optimizations and inlining for debugging
  #[arg(long, env = "PLUGFORGE_DEBUG", value_parser = FalseyValueParser::new())]
  pub debug: bool,

  /// Leave the workspace on disk after the build
  #[arg(long, env = "PLUGFORGE_SKIP_CLEANUP", value_parser = FalseyValueParser::new())]
  pub skip_cleanup: bool,

  /// Prepare the workspace but do not compile
  #[arg(long, env = "PLUGFORGE_SKIP_BUILD", value_parser = FalseyValueParser::new())]
  pub skip_build: bool,

  /// Timeout for dependency resolution, e.g. "5m"
  #[arg(long, env = "PLUGFORGE_TIMEOUT_GET", value_parser = humantime::parse_duration)]
  pub timeout_get: Option<Duration>,

  /// Timeout for compilation, e.g. "15m"
  #[arg(long, env = "PLUGFORGE_TIMEOUT_BUILD", value_parser = humantime::parse_duration)]
  pub timeout_build: Option<Duration>,

  /// Raw flags for `go build` (replaces the defaults)
  #[arg(long, env = "PLUGFORGE_GO_BUILD_FLAGS", allow_hyphen_values = true, value_name = "FLAGS")]
  pub build_flags: Option<String>,

  /// Raw flags for `go mod tidy`
  #[arg(long, env = "PLUGFORGE_GO_MOD_FLAGS", allow_hyphen_values = true, value_name = "FLAGS")]
  pub mod_flags: Option<String>,

  /// Target operating system (GOOS)
  #[arg(long)]
  pub os: Option<String>,

  /// Target architecture (GOARCH)
  #[arg(long)]
  pub arch: Option<String>,

  /// Target ARM variant (GOARM)
  #[arg(long)]
  pub arm: Option<String>,

  /// Enable cgo
  #[arg(long)]
  pub cgo: bool,

  /// Go toolchain to use
  #[arg(long = "go", env = "PLUGFORGE_GO", value_name = "PATH")]
  pub go_binary: Option<PathBuf>,

  /// Parent directory for the build workspace
  #[arg(long, value_name = "DIR")]
  pub workspace_dir: Option<PathBuf>,
}

fn load_config(path: &Path) -> Result<Builder> {
  let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Local filesystem replacements must be absolute: `go` runs inside the
/// workspace, not where the user typed the path.
fn absolutize_local(path: &ReplacementPath, cwd: &Path) -> ReplacementPath {
  let raw = path.as_str();
  let is_relative_path = raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../");
  if !is_relative_path {
    return path.clone();
  }
  let joined = cwd.join(raw);
  let resolved = dunce::canonicalize(&joined).unwrap_or(joined);
  ReplacementPath(resolved.to_string_lossy().into_owned())
}

fn default_output(cwd: &Path) -> PathBuf {
  if cfg!(windows) {
    cwd.join("caddy.exe")
  } else {
    cwd.join("caddy")
  }
}

impl BuildArgs {
  /// Assemble the effective build configuration.
  pub fn to_builder(&self, cwd: &Path) -> Result<Builder> {
    let mut builder = match &self.config {
      Some(path) => load_config(path)?,
      None => Builder::default(),
    };

    if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
      builder.host_version = Some(version.to_string());
    }

    for arg in &self.with {
      let (dep, replace) = parse_plugin_arg(arg).with_context(|| format!("Invalid --with value '{}'", arg))?;
      builder.plugins.push(dep);
      if let Some(mut replace) = replace {
        replace.new = absolutize_local(&replace.new, cwd);
        builder.replacements.push(replace);
      }
    }

    for arg in &self.replace {
      let mut replace = parse_replace_arg(arg).with_context(|| format!("Invalid --replace value '{}'", arg))?;
      replace.new = absolutize_local(&replace.new, cwd);
      builder.replacements.push(replace);
    }

    builder.race_detector |= self.race;
    builder.debug |= self.debug;
    builder.skip_cleanup |= self.skip_cleanup;
    builder.skip_build |= self.skip_build;

    if self.timeout_get.is_some() {
      builder.timeout_get = self.timeout_get;
    }
    if self.timeout_build.is_some() {
      builder.timeout_build = self.timeout_build;
    }
    if self.build_flags.is_some() {
      builder.build_flags = self.build_flags.clone();
    }
    if self.mod_flags.is_some() {
      builder.mod_flags = self.mod_flags.clone();
    }
    if self.os.is_some() {
      builder.compile.os = self.os.clone();
    }
    if self.arch.is_some() {
      builder.compile.arch = self.arch.clone();
    }
    if self.arm.is_some() {
      builder.compile.arm = self.arm.clone();
    }
    if self.cgo {
      builder.compile.cgo = Some(true);
    }
    if let Some(go) = &self.go_binary {
      builder.go_binary = go.clone();
    }
    if let Some(dir) = &self.workspace_dir {
      builder.workspace_parent = Some(cwd.join(dir));
    }

    Ok(builder)
  }
}

/// Execute the build command.
///
/// Ctrl-C cancels the toolchain step in flight; the workspace is still
/// removed before the command returns.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  let builder = args.to_builder(&cwd)?;
  let output = args.output.clone().unwrap_or_else(|| default_output(&cwd));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();
  let result = rt.block_on(async {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, canceling build");
        on_interrupt.cancel();
      }
    });
    builder.build(&cancel, &output).await
  });

  let report = match result {
    Ok(report) => report,
    Err(err) => {
      if let Some(diagnostics) = err.diagnostics() {
        print_diagnostics(diagnostics);
      }
      return Err(anyhow::Error::new(err).context("Build failed"));
    }
  };

  if report.compiled {
    print_success(&format!("Built {}", report.output.display()));
    print_stat("Target", &report.compile.target_label());
    print_stat("Duration", &format_duration(start.elapsed()));
  } else {
    print_info("Build skipped; workspace prepared");
  }

  if report.cgo_forced {
    print_warning("cgo was enabled because the race detector requires it");
  }
  if builder.skip_cleanup {
    print_stat("Workspace", &report.workspace.display().to_string());
  }
  if let Some(err) = report.cleanup_error {
    print_warning(&format!("{:#}", anyhow::Error::new(err).context("Workspace cleanup failed")));
  }

  Ok(())
}
