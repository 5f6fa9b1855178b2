pub const APP_NAME: &str = "plugforge";

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "buildenv_";

/// chrono format used for the timestamp in workspace directory names.
pub const WORKSPACE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// Host module path without its semantic import suffix.
pub const DEFAULT_HOST_MODULE: &str = "github.com/caddyserver/caddy";

/// Major version the default host module resolves to when the requested
/// version does not name one.
pub const DEFAULT_HOST_MAJOR: u64 = 2;

/// Module name given to `go mod init` inside the workspace.
pub const WORKSPACE_MODULE_NAME: &str = "caddy";

pub const DEFAULT_GO_BINARY: &str = "go";

pub const ENV_GOOS: &str = "GOOS";
pub const ENV_GOARCH: &str = "GOARCH";
pub const ENV_GOARM: &str = "GOARM";
pub const ENV_CGO_ENABLED: &str = "CGO_ENABLED";
