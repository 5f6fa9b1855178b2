//! Types for running toolchain commands.

use std::time::Duration;

use thiserror::Error;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  /// Standard output followed by standard error.
  pub fn combined(&self) -> String {
    match (self.stdout.is_empty(), self.stderr.is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
    }
  }
}

/// Errors from running a single command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The process could not be started.
  #[error("failed to start `{command}`")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// Waiting on the process failed.
  #[error("failed to wait for `{command}`")]
  Wait {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// The caller canceled the operation; the process was killed.
  #[error("`{command}` was canceled")]
  Canceled { command: String },

  /// The step deadline passed; the process was killed.
  #[error("`{command}` timed out after {}", humantime::format_duration(*.timeout))]
  TimedOut { command: String, timeout: Duration },

  /// The process ran and exited unsuccessfully.
  #[error("`{command}` failed ({})", describe_exit(*.code))]
  Failed {
    command: String,
    code: Option<i32>,
    output: String,
  },
}

fn describe_exit(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "terminated by signal".to_string(),
  }
}

impl CommandError {
  /// Captured stdout and stderr, when the process ran to completion.
  pub fn output(&self) -> Option<&str> {
    match self {
      CommandError::Failed { output, .. } => Some(output),
      _ => None,
    }
  }

  /// True for cancellation and timeouts.
  pub fn is_interrupted(&self) -> bool {
    matches!(self, CommandError::Canceled { .. } | CommandError::TimedOut { .. })
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, CommandError::TimedOut { .. })
  }
}
