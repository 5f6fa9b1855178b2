//! Builder and runner for external toolchain commands.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{CommandError, CommandOutput};
use crate::env::EnvVar;

/// A fully described external command: program, arguments, working
/// directory and environment.
///
/// When no environment list is set the child inherits the current process
/// environment. When one is set, it replaces the environment entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  program: PathBuf,
  args: Vec<OsString>,
  cwd: Option<PathBuf>,
  env: Option<Vec<EnvVar>>,
}

impl ToolCommand {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Replace the child environment with these entries.
  pub fn env_list(mut self, env: Vec<EnvVar>) -> Self {
    self.env = Some(env);
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn get_args(&self) -> &[OsString] {
    &self.args
  }

  pub fn get_current_dir(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }

  pub fn get_env(&self) -> Option<&[EnvVar]> {
    self.env.as_deref()
  }

  /// Run the command to completion.
  ///
  /// Returns early with [`CommandError::Canceled`] when `cancel` fires, or
  /// [`CommandError::TimedOut`] when `timeout` elapses; the process is killed
  /// in both cases. A zero timeout means no timeout.
  pub async fn run(&self, cancel: &CancellationToken, timeout: Option<Duration>) -> Result<CommandOutput, CommandError> {
    let command_line = self.to_string();
    let timeout = timeout.filter(|t| !t.is_zero());

    if cancel.is_cancelled() {
      return Err(CommandError::Canceled { command: command_line });
    }

    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }

    if let Some(env) = &self.env {
      command.env_clear();
      // Windows keeps per-drive cwd entries with empty keys
      command.envs(env.iter().filter(|(key, _)| !key.is_empty()).map(|(key, value)| (key, value)));
    }

    debug!(cmd = %command_line, cwd = ?self.cwd, timeout = ?timeout, "spawning process");

    let child = command.spawn().map_err(|source| CommandError::Spawn {
      command: command_line.clone(),
      source,
    })?;

    let deadline = async {
      match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending::<()>().await,
      }
    };

    // Dropping the wait future drops the child, and kill_on_drop kills it.
    let output = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!(cmd = %command_line, "command canceled");
        return Err(CommandError::Canceled { command: command_line });
      }
      _ = deadline => {
        debug!(cmd = %command_line, "command timed out");
        return Err(CommandError::TimedOut {
          command: command_line,
          timeout: timeout.unwrap_or_default(),
        });
      }
      output = child.wait_with_output() => output.map_err(|source| CommandError::Wait {
        command: command_line.clone(),
        source,
      })?,
    };

    let status = output.status;
    let output = CommandOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !status.success() {
      return Err(CommandError::Failed {
        command: command_line,
        code: status.code(),
        output: output.combined(),
      });
    }

    if !output.stdout.is_empty() {
      debug!(stdout = %output.stdout.trim_end(), "command stdout");
    }
    if !output.stderr.is_empty() {
      debug!(stderr = %output.stderr.trim_end(), "command stderr");
    }

    Ok(output)
  }
}

impl fmt::Display for ToolCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      let arg = arg.to_string_lossy();
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        write!(f, " {:?}", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}
