//! Child process execution with a hard timeout.

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use tubegate_core::EngineError;

/// Run `program` to completion, capturing stdout and stderr. The child is
/// killed if it outlives `limit`.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    limit: Duration,
) -> Result<Output, EngineError> {
    debug!(program, args = ?args, "Spawning engine process");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| EngineError::Unavailable(format!("failed to start {}: {}", program, e)))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| EngineError::Unavailable(format!("no stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| EngineError::Unavailable(format!("no stderr from {}", program)))?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let status = match timeout(limit, child.wait()).await {
        Ok(status) => status
            .map_err(|e| EngineError::Unavailable(format!("failed to wait for {}: {}", program, e)))?,
        Err(_) => {
            warn!(program, timeout_secs = limit.as_secs(), "Engine process timed out, killing");
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(EngineError::Timeout(limit.as_secs()));
        }
    };

    let stdout = collect(stdout_task).await?;
    let stderr = collect(stderr_task).await?;

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn collect(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, EngineError> {
    task.await
        .map_err(|e| EngineError::Unavailable(format!("pipe reader failed: {}", e)))?
        .map_err(|e| EngineError::Unavailable(format!("failed to read pipe: {}", e)))
}

/// Pick the most useful line out of engine stderr.
pub fn failure_detail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let error_line = text
        .lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string());

    match error_line {
        Some(line) if !line.is_empty() => line,
        _ => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                "engine exited with an error".to_string()
            } else {
                trimmed.lines().last().unwrap_or(trimmed).to_string()
            }
        }
    }
}
