//! Running helper programs that take their input on stdin.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Program not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Program timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Program exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Spawn `program`, feed `input` on stdin and return its stdout.
///
/// The child is killed if the timeout elapses or the future is dropped.
pub async fn run_piped(
    program: &Path,
    args: &[String],
    input: &[u8],
    timeout_secs: u64,
) -> Result<Vec<u8>, ExecError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound {
                    path: program.to_path_buf(),
                }
            } else {
                ExecError::Io(e)
            }
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ExecError::Io(std::io::Error::other("stdin not captured")))?;

    let result = timeout(Duration::from_secs(timeout_secs), async {
        stdin.write_all(input).await?;
        // close stdin so the program sees EOF
        drop(stdin);
        child.wait_with_output().await
    })
    .await;

    match result {
        Ok(Ok(output)) if output.status.success() => Ok(output.stdout),
        Ok(Ok(output)) => Err(ExecError::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(500)
                .collect(),
        }),
        Ok(Err(e)) => Err(ExecError::Io(e)),
        Err(_) => Err(ExecError::Timeout { timeout_secs }),
    }
}
