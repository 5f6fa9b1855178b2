//! Test utilities for plugforge-lib.
//!
//! Cross-platform shell helpers plus a fake `go` toolchain script that records
//! its invocations instead of compiling anything.

use std::path::{Path, PathBuf};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// A fake `go` binary. Every call appends its arguments to `log`.
///
/// - `mod init NAME` writes a go.mod
/// - `mod edit ARGS...` appends the args to go.mod as comments
/// - `mod tidy` succeeds without doing anything
/// - `build ... -o OUT` logs the platform env, then writes OUT
///
/// Integration tests that need failing or slow steps carry their own variant
/// with hooks.
#[cfg(unix)]
pub struct FakeGo {
  pub program: PathBuf,
  pub log: PathBuf,
}

#[cfg(unix)]
impl FakeGo {
  pub fn install(dir: &Path) -> Self {
    use std::os::unix::fs::PermissionsExt;

    let program = dir.join("go");
    let log = dir.join("go-calls.log");
    let script = format!(
      r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
case "$1" in
  mod)
    case "$2" in
      init) printf 'module %s\n' "$3" > go.mod ;;
      edit) shift 2; for a in "$@"; do printf '// %s\n' "$a" >> go.mod; done ;;
      tidy) ;;
    esac
    ;;
  build)
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; fi
      shift
    done
    printf 'env GOOS=%s GOARCH=%s CGO_ENABLED=%s\n' "$GOOS" "$GOARCH" "$CGO_ENABLED" >> '{log}'
    if [ -n "$out" ]; then printf 'binary\n' > "$out"; fi
    ;;
esac
exit 0
"#,
      log = log.display(),
    );
    std::fs::write(&program, script).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    Self { program, log }
  }

  /// Recorded invocations, one argument string per line.
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(&self.log)
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }
}
