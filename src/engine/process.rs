use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use crate::errors::HnpError;
use super::provider::EngineOutput;
use tracing::debug;

/// Run `program args...` to completion, capturing both streams.
///
/// The child is killed if `timeout` elapses first; that surfaces as
/// `HnpError::Timeout`, the same way the caller treats a non-zero exit.
pub async fn run_command<I, S>(
    program: &Path,
    args: I,
    timeout: Duration,
) -> Result<EngineOutput, HnpError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = ?command.as_std(), "Spawning engine process");
    let started = Instant::now();

    let child = command.spawn().map_err(|e| {
        HnpError::Engine(format!("Failed to spawn {}: {}", program.display(), e))
    })?;

    // Dropping the wait future on timeout drops the child, which kills it
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| HnpError::Timeout(format!(
            "{} did not finish within {}s",
            program.display(),
            timeout.as_secs()
        )))?
        .map_err(|e| HnpError::Engine(format!("Failed to wait for {}: {}", program.display(), e)))?;

    Ok(EngineOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration_ms: started.elapsed().as_millis() as u64,
    })
}
