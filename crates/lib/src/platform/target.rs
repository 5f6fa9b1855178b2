use serde::{Deserialize, Serialize};

use crate::consts::{ENV_CGO_ENABLED, ENV_GOARCH, ENV_GOARM, ENV_GOOS};
use crate::env::EnvSnapshot;

/// Target platform and cgo settings for `go build`.
///
/// Unset fields fall back to the ambient environment, and after that to the
/// toolchain's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arch: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arm: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cgo: Option<bool>,
}

impl Compile {
  /// Fill unset fields from `GOOS`, `GOARCH`, `GOARM` and `CGO_ENABLED`.
  pub fn with_env_defaults(&self, env: &EnvSnapshot) -> Self {
    let pick = |field: &Option<String>, key: &str| {
      field
        .clone()
        .filter(|v| !v.is_empty())
        .or_else(|| env.get_non_empty(key).map(str::to_string))
    };

    Self {
      os: pick(&self.os, ENV_GOOS),
      arch: pick(&self.arch, ENV_GOARCH),
      arm: pick(&self.arm, ENV_GOARM),
      cgo: self.cgo.or_else(|| env.get_non_empty(ENV_CGO_ENABLED).map(|v| v == "1")),
    }
  }

  pub fn cgo_enabled(&self) -> bool {
    self.cgo.unwrap_or(false)
  }

  /// Value for `CGO_ENABLED`.
  pub fn cgo_env_value(&self) -> &'static str {
    if self.cgo_enabled() { "1" } else { "0" }
  }

  /// The `key=value` entries to overlay on the compile environment.
  ///
  /// Platform keys that are still unset are left out so the toolchain
  /// applies its own defaults.
  pub fn env_overrides(&self) -> Vec<String> {
    let mut out = Vec::with_capacity(4);
    for (key, value) in [(ENV_GOOS, &self.os), (ENV_GOARCH, &self.arch), (ENV_GOARM, &self.arm)] {
      if let Some(value) = value {
        out.push(format!("{}={}", key, value));
      }
    }
    out.push(format!("{}={}", ENV_CGO_ENABLED, self.cgo_env_value()));
    out
  }

  /// Short `os/arch` label for logs.
  pub fn target_label(&self) -> String {
    format!(
      "{}/{}",
      self.os.as_deref().unwrap_or("default"),
      self.arch.as_deref().unwrap_or("default")
    )
  }
}
