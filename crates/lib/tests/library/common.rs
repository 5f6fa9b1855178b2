//! Shared helpers for library integration tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use plugforge_lib::Builder;
use plugforge_lib::env::EnvSnapshot;
use tempfile::TempDir;

/// Isolated test environment: a fake `go`, a workspace parent and an output
/// directory, each in its own temp dir.
pub struct TestEnv {
  pub tools: TempDir,
  pub workspaces: TempDir,
  pub out: TempDir,
  pub go: PathBuf,
  pub log: PathBuf,
}

impl TestEnv {
  /// A toolchain where every command succeeds.
  pub fn new() -> Self {
    Self::with_hooks(":", ":")
  }

  /// `tidy_hook` and `build_hook` are shell snippets run by `go mod tidy` and
  /// `go build` before they do anything else.
  pub fn with_hooks(tidy_hook: &str, build_hook: &str) -> Self {
    let tools = TempDir::new().unwrap();
    let go = tools.path().join("go");
    let log = tools.path().join("calls.log");
    let script = format!(
      r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
case "$1" in
  mod)
    case "$2" in
      init) printf 'module %s\n' "$3" > go.mod ;;
      edit) shift 2; for a in "$@"; do printf '// %s\n' "$a" >> go.mod; done ;;
      tidy) {tidy_hook} ;;
    esac
    ;;
  build)
    {build_hook}
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; fi
      shift
    done
    printf 'env GOOS=%s GOARCH=%s GOARM=%s CGO_ENABLED=%s\n' "$GOOS" "$GOARCH" "$GOARM" "$CGO_ENABLED" >> '{log}'
    if [ -n "$out" ]; then printf 'binary\n' > "$out"; fi
    ;;
esac
exit 0
"#,
      log = log.display(),
    );
    std::fs::write(&go, script).unwrap();
    std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();

    Self {
      tools,
      workspaces: TempDir::new().unwrap(),
      out: TempDir::new().unwrap(),
      go,
      log,
    }
  }

  /// A builder wired to the fake toolchain and the isolated workspace parent.
  pub fn builder(&self) -> Builder {
    Builder {
      go_binary: self.go.clone(),
      workspace_parent: Some(self.workspaces.path().to_path_buf()),
      ..Default::default()
    }
  }

  /// Minimal environment: just enough PATH for the fake toolchain.
  pub fn env(&self) -> EnvSnapshot {
    EnvSnapshot::from_vars([("PATH", std::env::var_os("PATH").unwrap_or_default())])
  }

  pub fn output(&self, name: &str) -> PathBuf {
    self.out.path().join(name)
  }

  /// Recorded toolchain invocations.
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(&self.log)
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  pub fn ran(&self, prefix: &str) -> bool {
    self.calls().iter().any(|c| c.starts_with(prefix))
  }

  /// Directories currently present under the workspace parent.
  pub fn workspace_dirs(&self) -> Vec<PathBuf> {
    list_dir(self.workspaces.path())
  }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
  std::fs::read_dir(dir)
    .unwrap()
    .map(|e| e.unwrap().path())
    .collect()
}
