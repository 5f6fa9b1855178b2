//! Go module paths, plugin dependencies and replacement directives.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Go module that should be compiled into the custom binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  /// Import path of the module. Versions above v1 carry the semantic import
  /// version suffix (e.g. `/v2`).
  #[serde(rename = "module_path")]
  pub package_path: String,

  /// Version to require. `None` lets `go mod tidy` pick the latest.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

impl Dependency {
  pub fn new(package_path: impl Into<String>, version: Option<String>) -> Self {
    Self {
      package_path: package_path.into(),
      version: version.filter(|v| !v.is_empty()),
    }
  }

  /// The `path@version` argument for `go mod edit -require`, if versioned.
  pub fn require_param(&self) -> Option<String> {
    self
      .version
      .as_deref()
      .map(|version| format!("{}@{}", self.package_path, version))
  }
}

/// One side of a replace directive. May carry a version, either already in
/// `path@version` form or as `path version` the way go.mod spells it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplacementPath(pub String);

impl ReplacementPath {
  /// Reformat for `go mod edit`: the first space becomes `@`.
  pub fn param(&self) -> String {
    self.0.replacen(' ', "@", 1)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ReplacementPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ReplacementPath {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// A module replacement, applied with `go mod edit -replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replace {
  /// The module being replaced.
  pub old: ReplacementPath,
  /// What replaces it: another module (optionally versioned) or a local path.
  pub new: ReplacementPath,
}

impl Replace {
  pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
    Self {
      old: ReplacementPath(old.into()),
      new: ReplacementPath(new.into()),
    }
  }

  /// The `old=new` value passed to `-replace`.
  pub fn param(&self) -> String {
    format!("{}={}", self.old.param(), self.new.param())
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginArgError {
  #[error("empty module path in '{0}'")]
  EmptyModule(String),

  #[error("empty replacement in '{0}'")]
  EmptyReplacement(String),

  #[error("malformed replacement '{0}', expected OLD=NEW")]
  MalformedReplace(String),
}

/// Parse a plugin argument of the form `module[@version][=replacement]`.
///
/// The replacement is returned verbatim; callers that accept local paths are
/// responsible for making them absolute.
pub fn parse_plugin_arg(arg: &str) -> Result<(Dependency, Option<Replace>), PluginArgError> {
  let (module, replacement) = match arg.split_once('=') {
    Some((module, repl)) => {
      if repl.trim().is_empty() {
        return Err(PluginArgError::EmptyReplacement(arg.to_string()));
      }
      (module.trim(), Some(repl.trim()))
    }
    None => (arg.trim(), None),
  };

  let (path, version) = match module.split_once('@') {
    Some((path, version)) => (path, Some(version.to_string())),
    None => (module, None),
  };
  if path.is_empty() {
    return Err(PluginArgError::EmptyModule(arg.to_string()));
  }

  let replace = replacement.map(|repl| Replace::new(path, repl));
  Ok((Dependency::new(path, version), replace))
}

/// Parse a bare `OLD=NEW` replacement argument.
pub fn parse_replace_arg(arg: &str) -> Result<Replace, PluginArgError> {
  match arg.split_once('=') {
    Some((old, new)) if !old.trim().is_empty() && !new.trim().is_empty() => Ok(Replace::new(old.trim(), new.trim())),
    _ => Err(PluginArgError::MalformedReplace(arg.to_string())),
  }
}

/// Major version of a Go version string such as `v2.7.6`, if it has one.
pub fn major_version(version: &str) -> Option<u64> {
  let rest = version.strip_prefix('v')?;
  let major = rest.split(['.', '-', '+']).next()?;
  major.parse().ok()
}

/// Strip a trailing `/vN` semantic import suffix from a module path.
fn strip_major_suffix(module: &str) -> &str {
  match module.rsplit_once('/') {
    Some((base, last)) if last.len() > 1 && last.starts_with('v') && last[1..].chars().all(|c| c.is_ascii_digit()) => {
      base
    }
    _ => module,
  }
}

/// Module path to import for `module` at `version`.
///
/// Go requires a `/vN` suffix for major versions two and above. When the
/// version does not look like a semantic version (a branch or commit), the
/// module path is kept as configured.
pub fn versioned_module_path(module: &str, version: Option<&str>) -> String {
  match version.and_then(major_version) {
    Some(major) if major >= 2 => format!("{}/v{}", strip_major_suffix(module), major),
    Some(_) => strip_major_suffix(module).to_string(),
    None => module.to_string(),
  }
}
