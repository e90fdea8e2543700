//! External command execution.
//!
//! Programs are spawned directly with an argument vector; no shell is ever
//! involved, so argument contents cannot change the command line. Every run
//! has a deadline, and the child is killed when the deadline drops the
//! future. Output is read while the child runs and only the first
//! `MAX_CAPTURE_BYTES` of each stream are kept; the rest is discarded.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::guard::{SafeHostname, SafePath};

/// Captured output is cut to this many bytes per stream.
const MAX_CAPTURE_BYTES: usize = 4096;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command exceeded {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Spawns real processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            tokio::try_join!(child.wait(), read_capped(stdout), read_capped(stderr))
        };

        let (status, stdout, stderr) = tokio::time::timeout(timeout, collect)
            .await
            .map_err(|_| CommandError::Timeout(timeout))?
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Keep the first `MAX_CAPTURE_BYTES`, then drain the pipe so the child
/// never blocks on a full buffer.
async fn read_capped<R>(reader: Option<R>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::with_capacity(MAX_CAPTURE_BYTES);
    (&mut reader)
        .take(MAX_CAPTURE_BYTES as u64)
        .read_to_end(&mut kept)
        .await?;
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(kept)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Reachable,
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct HostVerification {
    pub host: SafeHostname,
    pub status: HostStatus,
    pub output: CommandOutput,
}

/// `<program> -c 1 -W 1 <host>`; the host is its own argv entry.
pub fn ping_args(host: &SafeHostname) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        "1".to_string(),
        host.as_str().to_string(),
    ]
}

pub async fn verify_host(
    runner: &dyn CommandRunner,
    program: &str,
    host: SafeHostname,
    timeout: Duration,
) -> Result<HostVerification, CommandError> {
    let output = runner.run(program, &ping_args(&host), timeout).await?;
    let status = if output.success() {
        HostStatus::Reachable
    } else {
        HostStatus::Unreachable
    };
    Ok(HostVerification {
        host,
        status,
        output,
    })
}

/// `<program> --input=<path>`; the flag and path form one argv entry.
pub fn process_file_args(input: &Path) -> Vec<String> {
    vec![format!("--input={}", input.display())]
}

/// Run the processor on a file the path guard already confined to the
/// storage root.
pub async fn process_file(
    runner: &dyn CommandRunner,
    program: &str,
    input: &SafePath,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    runner
        .run(program, &process_file_args(input.as_path()), timeout)
        .await
}
