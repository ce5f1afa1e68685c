// Helper functions shared by the resolver and its collaborators

use std::process::Stdio;
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::ResolveError;

/// Run a command, capturing stdout/stderr, killing it after `timeout_secs`.
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, ResolveError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResolveError::ToolNotFound(program.to_string()),
            _ => ResolveError::unavailable(program, format!("failed to start: {}", e)),
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ResolveError::unavailable(program, "stdout not captured"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ResolveError::unavailable(program, "stderr not captured"))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let limit = Duration::from_secs(timeout_secs);
    match timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status
                .map_err(|e| ResolveError::unavailable(program, format!("wait failed: {}", e)))?;
            let stdout = collect_pipe(program, stdout_task).await?;
            let stderr = collect_pipe(program, stderr_task).await?;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ResolveError::Timeout {
                origin: program.to_string(),
                after: limit,
            })
        }
    }
}

async fn collect_pipe(
    program: &str,
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, ResolveError> {
    task.await
        .map_err(|e| ResolveError::unavailable(program, format!("pipe task failed: {}", e)))?
        .map_err(|e| ResolveError::unavailable(program, format!("pipe read failed: {}", e)))
}

/// Current UTC time as RFC 3339
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

/// "1:02:03" / "4:05" -> seconds; missing or unparseable text is 0
pub fn parse_duration_text(text: Option<&str>) -> u64 {
    let Some(text) = text else {
        return 0;
    };

    text.trim()
        .split(':')
        .rev()
        .enumerate()
        .try_fold(0u64, |total, (i, part)| {
            part.trim()
                .parse::<u64>()
                .ok()
                .map(|value| total + value * 60u64.pow(i as u32))
        })
        .unwrap_or(0)
}

/// Seconds -> "H:MM:SS" or "M:SS"; zero is "0:00"
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
