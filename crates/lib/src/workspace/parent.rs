//! Where workspace directories are created.

use std::io;
use std::path::PathBuf;

use crate::platform::HostOs;

/// Parent directory for new workspaces on `host`. `None` means the system
/// temp directory.
///
/// macOS mounts the default temp location in a way that makes the linker
/// silently drop `-ldflags` metadata from the produced binary, so there the
/// workspace goes under the current directory instead. The path is absolute
/// so removal still works if the process changes directory later.
pub fn workspace_parent_dir(host: HostOs) -> io::Result<Option<PathBuf>> {
  match host {
    HostOs::MacOs => {
      let cwd = std::env::current_dir()?;
      Ok(Some(dunce::simplified(&cwd).to_path_buf()))
    }
    HostOs::Linux | HostOs::Windows | HostOs::Other => Ok(None),
  }
}

/// Resolve the parent directory, preferring an explicit override.
pub fn resolve_parent_dir(explicit: Option<&PathBuf>, host: HostOs) -> io::Result<Option<PathBuf>> {
  match explicit {
    Some(dir) => Ok(Some(dir.clone())),
    None => workspace_parent_dir(host),
  }
}
