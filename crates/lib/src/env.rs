//! Environment snapshots and overlays for toolchain invocations.
//!
//! The ambient process environment is read exactly once, at the boundary,
//! into an [`EnvSnapshot`]. Everything downstream works on plain lists of
//! key/value pairs and never touches the real process environment.
//!
//! Keys and values are kept as `OsString`, so entries the build does not
//! overlay reach the toolchain byte for byte.

use std::ffi::{OsStr, OsString};

/// One environment entry.
pub type EnvVar = (OsString, OsString);

/// An ordered capture of environment entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
  entries: Vec<EnvVar>,
}

impl EnvSnapshot {
  /// Capture the environment of the current process.
  pub fn capture() -> Self {
    Self {
      entries: std::env::vars_os().collect(),
    }
  }

  /// Build a snapshot from `key=value` strings.
  pub fn from_entries<I, S>(entries: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      entries: entries.into_iter().map(|e| parse_entry(e.as_ref())).collect(),
    }
  }

  /// Build a snapshot from key/value pairs.
  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
  {
    Self {
      entries: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  /// Look up the value of `key`. The first matching entry wins. Values that
  /// are not valid Unicode read as `None`.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(k, _)| k.as_os_str() == OsStr::new(key))
      .and_then(|(_, v)| v.to_str())
  }

  /// Like [`get`](Self::get), but treats an empty value as unset.
  pub fn get_non_empty(&self, key: &str) -> Option<&str> {
    self.get(key).filter(|v| !v.is_empty())
  }

  pub fn entries(&self) -> &[EnvVar] {
    &self.entries
  }
}

/// Split a `key=value` entry. An entry without `=` is all key.
fn parse_entry(entry: &str) -> EnvVar {
  let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
  (OsString::from(key), OsString::from(value))
}

/// Return a copy of `env` with `set` (of the form `key=value`) applied.
///
/// If the key already exists, the first entry for it is replaced in place and
/// any later entries for the same key are dropped. Otherwise the entry is
/// appended. `env` itself is never modified.
pub fn overlay(env: &[EnvVar], set: &str) -> Vec<EnvVar> {
  let (key, value) = parse_entry(set);
  let mut out = Vec::with_capacity(env.len() + 1);
  let mut placed = false;

  for entry in env {
    if entry.0 != key {
      out.push(entry.clone());
    } else if !placed {
      out.push((key.clone(), value.clone()));
      placed = true;
    }
  }

  if !placed {
    out.push((key, value));
  }
  out
}

/// Apply every entry of `sets` in order, see [`overlay`].
pub fn overlay_all<I, S>(env: &[EnvVar], sets: I) -> Vec<EnvVar>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  sets
    .into_iter()
    .fold(env.to_vec(), |acc, set| overlay(&acc, set.as_ref()))
}
