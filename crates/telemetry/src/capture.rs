//! Capture tool resolution and lifecycle.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::CaptureError;

/// Windows `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Remove one layer of matching single or double quotes.
///
/// Paths pasted from Explorer or set in environment variables often carry
/// them.
pub fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Resolve the capture tool executable.
///
/// Priority: explicit flag, then the environment value, then the configured
/// path, then each of `candidates` searched on `search_path`. The first
/// candidate that is an existing file wins.
///
/// The environment and `PATH` values are passed in rather than read here so
/// callers decide where they come from.
///
/// # Errors
///
/// [`CaptureError::NotFound`] listing every candidate checked.
pub fn resolve_capture_tool(
    cli_override: Option<&OsStr>,
    env_value: Option<&OsStr>,
    env_var: &str,
    configured: Option<&Path>,
    search_path: Option<&OsStr>,
    candidates: &[String],
) -> Result<PathBuf, CaptureError> {
    let mut tried: Vec<String> = Vec::new();

    let explicit = [cli_override, env_value, configured.map(Path::as_os_str)];
    for value in explicit.into_iter().flatten() {
        let raw = value.to_string_lossy();
        let cleaned = strip_quotes(&raw);
        if cleaned.is_empty() {
            continue;
        }
        let path = PathBuf::from(cleaned);
        if path.is_file() {
            debug!(path = ?path, "Resolved capture tool");
            return Ok(path);
        }
        tried.push(path.display().to_string());
    }

    if let Some(search_path) = search_path {
        for name in candidates {
            for dir in std::env::split_paths(search_path) {
                let path = dir.join(name);
                if path.is_file() {
                    debug!(path = ?path, "Resolved capture tool on PATH");
                    return Ok(path);
                }
            }
            tried.push(format!("{name} on PATH"));
        }
    }

    Err(CaptureError::NotFound {
        tried: tried.join(", "),
        env_var: env_var.to_string(),
    })
}

/// Expand `{exe}` and `{log}` in a launch argument template.
pub fn expand_args(template: &[String], exe_name: &str, log_path: &Path) -> Vec<OsString> {
    template
        .iter()
        .map(|arg| {
            let log = log_path.to_string_lossy();
            OsString::from(arg.replace("{exe}", exe_name).replace("{log}", &log))
        })
        .collect()
}

/// A running capture tool owned by the controller.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
    executable: PathBuf,
}

impl CaptureProcess {
    /// Remove any stale log and start the capture tool.
    ///
    /// The child is killed if this handle is dropped without
    /// [`CaptureProcess::terminate`].
    ///
    /// # Errors
    ///
    /// [`CaptureError::StaleLog`] if the old log cannot be removed,
    /// [`CaptureError::Spawn`] if the process cannot be started.
    pub fn launch(
        executable: &Path,
        args: Vec<OsString>,
        stale_log: Option<&Path>,
    ) -> Result<Self, CaptureError> {
        if let Some(log) = stale_log {
            match std::fs::remove_file(log) {
                Ok(()) => debug!(path = ?log, "Removed stale capture log"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(CaptureError::StaleLog {
                        path: log.to_path_buf(),
                        source,
                    });
                }
            }
        }

        let mut command = Command::new(executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let child = command.spawn().map_err(|source| CaptureError::Spawn {
            path: executable.to_path_buf(),
            source,
        })?;

        info!(path = ?executable, pid = ?child.id(), "Started capture tool");
        Ok(Self {
            child,
            executable: executable.to_path_buf(),
        })
    }

    /// Executable this process was started from.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Stop the capture tool and reap it.
    pub async fn terminate(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(path = ?self.executable, error = %e, "Failed to stop capture tool");
        } else {
            info!(path = ?self.executable, "Capture tool stopped");
        }
    }
}
