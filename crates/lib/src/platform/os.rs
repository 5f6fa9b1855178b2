use std::fmt;

/// Host operating systems with behavior that differs for workspace setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOs {
  Linux,
  MacOs,
  Windows,
  Other,
}

impl HostOs {
  /// Detect the operating system this process runs on.
  pub fn current() -> Self {
    Self::from_rust_os(std::env::consts::OS)
  }

  /// Map a Rust `target_os` name (as in `std::env::consts::OS`).
  pub fn from_rust_os(os: &str) -> Self {
    match os {
      "linux" => Self::Linux,
      "macos" => Self::MacOs,
      "windows" => Self::Windows,
      _ => Self::Other,
    }
  }

  /// The `GOOS` spelling of this operating system, if it has a fixed one.
  pub fn as_goos(&self) -> Option<&'static str> {
    match self {
      Self::Linux => Some("linux"),
      Self::MacOs => Some("darwin"),
      Self::Windows => Some("windows"),
      Self::Other => None,
    }
  }
}

impl fmt::Display for HostOs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_goos().unwrap_or("other"))
  }
}
