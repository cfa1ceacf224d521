use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::AcaEnvError;

/// Outcome of running one generated script.
#[derive(Debug)]
pub struct ScriptRun {
    pub script: PathBuf,
    pub success: bool,
    /// stderr, or the spawn error if the script never started. stdout is not captured.
    pub error: String,
}

impl ScriptRun {
    pub fn hint(&self) -> Option<&'static str> {
        if self.success {
            None
        } else {
            classify_failure(&self.error)
        }
    }
}

/// Set `rwxr-xr-x`. A no-op on non-Unix platforms.
pub fn make_executable(path: &Path) -> Result<(), AcaEnvError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = std::fs::metadata(path)?.permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

/// Mark `script` executable and run it to completion. Never retries.
/// stdout streams straight to the terminal; stderr is kept for [`classify_failure`].
pub fn run_script(script: &Path) -> ScriptRun {
    let mut run = ScriptRun {
        script: script.to_path_buf(),
        success: false,
        error: String::new(),
    };

    if let Err(e) = make_executable(script) {
        run.error = e.to_string();
        return run;
    }

    debug!(script = %script.display(), "running");
    match Command::new(script).stdout(Stdio::inherit()).output() {
        Ok(output) => {
            run.success = output.status.success();
            run.error = String::from_utf8_lossy(&output.stderr).into_owned();
            if !run.success && run.error.trim().is_empty() {
                run.error = format!("exited with {}", output.status);
            }
        }
        Err(e) => run.error = e.to_string(),
    }
    run
}

/// Map common `az` failures to a next step for the user.
pub fn classify_failure(error: &str) -> Option<&'static str> {
    let lower = error.to_lowercase();
    if lower.contains("az login") || lower.contains("not logged in") {
        Some("You are not logged in to Azure. Run `az login` and try again.")
    } else if lower.contains("az: command not found") || lower.contains("az: not found") {
        Some("The Azure CLI (`az`) is not installed or not on PATH.")
    } else if lower.contains("extension") && lower.contains("containerapp") {
        Some("Install the Container Apps extension: `az extension add --name containerapp`.")
    } else if lower.contains("resourcenotfound")
        || lower.contains("resourcegroupnotfound")
        || lower.contains("could not be found")
    {
        Some("Check the container app name and resource group.")
    } else if lower.contains("permission denied") {
        Some("The script could not be executed. Check the file permissions.")
    } else {
        None
    }
}
