//! End-to-end builds against a fake `go` toolchain.

use std::time::{Duration, Instant};

use plugforge_lib::env::{EnvSnapshot, overlay_all};
use plugforge_lib::execute::CommandError;
use plugforge_lib::gomod::{Dependency, Replace};
use plugforge_lib::platform::Compile;
use plugforge_lib::{BuildError, Builder, CancellationToken};
use serial_test::serial;

use super::common::{TestEnv, list_dir};

mod validation {
  use super::*;

  #[tokio::test]
  async fn empty_output_path_creates_nothing() {
    let t = TestEnv::new();
    let err = t
      .builder()
      .build_with_env(&CancellationToken::new(), "", &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::MissingOutputPath));
    assert!(t.workspace_dirs().is_empty());
    assert!(t.calls().is_empty());
  }

  #[tokio::test]
  async fn invalid_mod_flags_create_nothing() {
    let t = TestEnv::new();
    let builder = Builder {
      mod_flags: Some("\"unbalanced".into()),
      ..t.builder()
    };
    let err = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::InvalidFlags { kind: "mod", .. }));
    assert!(t.workspace_dirs().is_empty());
  }
}

mod skip_build {
  use super::*;

  #[tokio::test]
  async fn runs_no_toolchain_steps_and_cleans_up() {
    let t = TestEnv::new();
    let builder = Builder {
      skip_build: true,
      host_version: Some("v2.8.4".into()),
      ..t.builder()
    };
    let report = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap();

    assert!(!report.compiled);
    assert!(t.ran("mod init caddy"));
    assert!(!t.ran("mod tidy"));
    assert!(!t.ran("build"));
    assert!(!t.output("caddy").exists());
    assert!(!report.workspace.exists());
    assert!(t.workspace_dirs().is_empty());
  }

  #[tokio::test]
  async fn with_skip_cleanup_keeps_workspace() {
    let t = TestEnv::new();
    let builder = Builder {
      skip_build: true,
      skip_cleanup: true,
      ..t.builder()
    };
    let report = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap();

    assert!(report.workspace.join("go.mod").exists());
    assert!(report.workspace.join("main.go").exists());
    assert_eq!(t.workspace_dirs(), vec![report.workspace.clone()]);
  }
}

mod success {
  use super::*;

  struct CwdGuard(std::path::PathBuf);

  impl Drop for CwdGuard {
    fn drop(&mut self) {
      let _ = std::env::set_current_dir(&self.0);
    }
  }

  #[tokio::test]
  #[serial]
  async fn relative_output_resolves_against_current_directory() {
    let t = TestEnv::new();
    let _guard = CwdGuard(std::env::current_dir().unwrap());
    std::env::set_current_dir(t.out.path()).unwrap();
    std::fs::create_dir(t.out.path().join("out")).unwrap();

    let builder = Builder {
      host_version: Some("v1.0.0".into()),
      ..t.builder()
    };
    let report = builder
      .build_with_env(&CancellationToken::new(), "./out/app", &t.env())
      .await
      .unwrap();

    let expected = std::path::absolute(t.out.path().join("out/app")).unwrap();
    assert!(report.output.is_absolute());
    assert!(report.compiled);
    assert!(expected.exists());
    assert!(!report.workspace.exists());
    assert!(t.workspace_dirs().is_empty());
    assert!(t.ran("mod edit -require=github.com/caddyserver/caddy@v1.0.0"));
  }

  #[tokio::test]
  async fn raw_byte_output_path_is_written_as_given() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let t = TestEnv::new();
    let out = t.out.path().join(OsStr::from_bytes(b"app-\xff"));
    let report = t
      .builder()
      .build_with_env(&CancellationToken::new(), &out, &t.env())
      .await
      .unwrap();

    assert_eq!(report.output, out);
    assert!(out.exists());
    assert_eq!(list_dir(t.out.path()), vec![out.clone()]);
  }

  #[tokio::test]
  async fn raw_byte_environment_reaches_toolchain() {
    use std::ffi::{OsStr, OsString};
    use std::os::unix::ffi::OsStrExt;

    let t = TestEnv::with_hooks(":", "printf '%s' \"$RAW_VAR\" > \"$RAW_DUMP\"");
    let dump = t.out.path().join("raw-var.dump");
    let mut vars = t.env().entries().to_vec();
    vars.push((OsString::from("RAW_VAR"), OsStr::from_bytes(b"X\xff").to_os_string()));
    vars.push((OsString::from("RAW_DUMP"), dump.clone().into_os_string()));

    t.builder()
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &EnvSnapshot::from_vars(vars))
      .await
      .unwrap();

    assert_eq!(std::fs::read(&dump).unwrap(), b"X\xff");
  }

  #[tokio::test]
  async fn steps_run_in_order() {
    let t = TestEnv::new();
    let builder = Builder {
      host_version: Some("v2.8.4".into()),
      plugins: vec![Dependency::new("github.com/example/dns", None)],
      ..t.builder()
    };
    let out = t.output("caddy");
    builder
      .build_with_env(&CancellationToken::new(), &out, &t.env())
      .await
      .unwrap();

    let calls = t.calls();
    assert_eq!(calls[0], "mod init caddy");
    assert_eq!(calls[1], "mod edit -require=github.com/caddyserver/caddy/v2@v2.8.4");
    assert_eq!(calls[2], "mod tidy -e");
    assert_eq!(
      calls[3],
      format!("build -ldflags -w -s -trimpath -o {}", out.display())
    );
    assert!(out.exists());
  }

  #[tokio::test]
  async fn replacement_is_normalized() {
    let t = TestEnv::new();
    let builder = Builder {
      replacements: vec![Replace::new("example.com/plugin", "example.com/plugin v2.3.1")],
      ..t.builder()
    };
    builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap();

    assert!(t.ran("mod edit -replace example.com/plugin=example.com/plugin@v2.3.1"));
  }

  #[tokio::test]
  async fn replacements_apply_in_caller_order_without_dedup() {
    let t = TestEnv::new();
    let builder = Builder {
      replacements: vec![Replace::new("example.com/a", "../one"), Replace::new("example.com/a", "../two")],
      ..t.builder()
    };
    builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap();

    let replaces: Vec<_> = t.calls().into_iter().filter(|c| c.contains("-replace")).collect();
    assert_eq!(
      replaces,
      vec![
        "mod edit -replace example.com/a=../one",
        "mod edit -replace example.com/a=../two"
      ]
    );
  }

  #[tokio::test]
  async fn target_environment_overlays_ambient_values() {
    let t = TestEnv::new();
    let env = EnvSnapshot::from_vars(overlay_all(t.env().entries(), ["GOOS=freebsd", "GOARCH=amd64"]));
    let builder = Builder {
      compile: Compile {
        arch: Some("arm".into()),
        arm: Some("7".into()),
        ..Default::default()
      },
      ..t.builder()
    };
    let report = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &env)
      .await
      .unwrap();

    assert!(t.ran("env GOOS=freebsd GOARCH=arm GOARM=7 CGO_ENABLED=0"));
    assert_eq!(report.compile.os.as_deref(), Some("freebsd"));
    assert!(!report.cgo_forced);
  }

  #[tokio::test]
  async fn race_detector_enables_cgo_in_compile_env() {
    let t = TestEnv::new();
    let builder = Builder {
      race_detector: true,
      debug: true,
      ..t.builder()
    };
    let out = t.output("caddy");
    let report = builder
      .build_with_env(&CancellationToken::new(), &out, &t.env())
      .await
      .unwrap();

    assert!(report.cgo_forced);
    assert!(t.ran("env GOOS= GOARCH= GOARM= CGO_ENABLED=1"));
    assert!(t.ran(&format!(
      "build -trimpath -gcflags all=-N -l -race -o {}",
      out.display()
    )));
    assert_eq!(builder.compile.cgo, None);
  }

  #[tokio::test]
  async fn concurrent_builds_use_separate_workspaces() {
    let t = TestEnv::new();
    let builder = Builder {
      skip_cleanup: true,
      ..t.builder()
    };
    let cancel = CancellationToken::new();
    let env = t.env();

    let (a, b) = tokio::join!(
      builder.build_with_env(&cancel, t.output("a"), &env),
      builder.build_with_env(&cancel, t.output("b"), &env),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.workspace, b.workspace);
    assert_eq!(t.workspace_dirs().len(), 2);
    assert!(t.output("a").exists());
    assert!(t.output("b").exists());
  }
}

mod failures {
  use super::*;

  #[tokio::test]
  async fn tidy_failure_aborts_before_compile() {
    let t = TestEnv::with_hooks("echo 'missing go.sum entry' >&2; exit 1", ":");
    let err = t
      .builder()
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::DependencyResolution(_)));
    assert!(err.is_toolchain_failure());
    assert!(err.diagnostics().unwrap().contains("missing go.sum entry"));
    assert!(!t.ran("build"));
    assert!(t.workspace_dirs().is_empty());
  }

  #[tokio::test]
  async fn tidy_timeout_is_dependency_error() {
    let t = TestEnv::with_hooks("exec sleep 30", ":");
    let builder = Builder {
      timeout_get: Some(Duration::from_millis(200)),
      ..t.builder()
    };
    let err = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::DependencyResolution(CommandError::TimedOut { .. })));
    assert!(err.is_interrupted());
    assert!(t.workspace_dirs().is_empty());
  }

  #[tokio::test]
  async fn compile_failure_keeps_workspace_with_skip_cleanup() {
    let t = TestEnv::with_hooks(":", "echo 'undefined: caddy.Foo' >&2; exit 2");
    let builder = Builder {
      skip_cleanup: true,
      ..t.builder()
    };
    let err = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    match &err {
      BuildError::Compile(CommandError::Failed { code, output, .. }) => {
        assert_eq!(*code, Some(2));
        assert!(output.contains("undefined: caddy.Foo"));
      }
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.workspace_dirs().len(), 1);
    assert!(list_dir(&t.workspace_dirs()[0]).iter().any(|p| p.ends_with("go.mod")));
  }

  #[tokio::test]
  async fn compile_timeout_removes_workspace_and_produces_nothing() {
    let t = TestEnv::with_hooks(":", "exec sleep 30");
    let builder = Builder {
      timeout_build: Some(Duration::from_millis(300)),
      ..t.builder()
    };
    let start = Instant::now();
    let err = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::Compile(CommandError::TimedOut { .. })));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!t.output("caddy").exists());
    assert!(t.workspace_dirs().is_empty());
  }

  #[tokio::test]
  async fn cancellation_stops_compile_and_cleans_up() {
    let t = TestEnv::with_hooks(":", "exec sleep 30");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(300)).await;
      trigger.cancel();
    });

    let err = t
      .builder()
      .build_with_env(&cancel, t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::Compile(CommandError::Canceled { .. })));
    assert!(!t.output("caddy").exists());
    assert!(t.workspace_dirs().is_empty());
  }

  #[tokio::test]
  async fn missing_toolchain_is_workspace_error() {
    let t = TestEnv::new();
    let builder = Builder {
      go_binary: t.tools.path().join("no-such-go"),
      ..t.builder()
    };
    let err = builder
      .build_with_env(&CancellationToken::new(), t.output("caddy"), &t.env())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::Workspace(_)));
    assert!(!err.is_toolchain_failure());
    assert!(t.workspace_dirs().is_empty());
  }
}
