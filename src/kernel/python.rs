//! Python interpreter process bootstrap and line-delimited JSON protocol.

use std::io::Write as _;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tempfile::TempPath;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time;

const BOOTSTRAP: &str = include_str!("bootstrap.py");

const START_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct CellRequest<'a> {
    id: u64,
    code: &'a str,
}

#[derive(Deserialize)]
struct CellReply {
    id: u64,
    status: String,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
    #[serde(default)]
    traceback: Vec<String>,
}

/// A running Python interpreter executing cells one at a time.
///
/// State persists across cells within one kernel (a shared module namespace),
/// matching notebook execution semantics.
pub struct PythonKernel {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    alive: bool,
    _bootstrap: TempPath,
}

impl PythonKernel {
    /// Spawn the interpreter and wait for its ready handshake.
    pub async fn start(python_bin: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("nbrun-kernel-")
            .suffix(".py")
            .tempfile()?;
        file.write_all(BOOTSTRAP.as_bytes())?;
        file.flush()?;
        let bootstrap = file.into_temp_path();

        let mut cmd = Command::new(python_bin);
        cmd.arg("-u") // unbuffered
            .arg(&*bootstrap)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| anyhow!("failed to start interpreter '{}': {}", python_bin, e))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("no stdout"))?;
        let mut lines = BufReader::new(stdout).lines();

        let ready = time::timeout(START_TIMEOUT, lines.next_line())
            .await
            .map_err(|_| {
                anyhow!(
                    "interpreter '{}' did not become ready within {}s",
                    python_bin,
                    START_TIMEOUT.as_secs()
                )
            })??
            .ok_or_else(|| anyhow!("interpreter '{}' exited during startup", python_bin))?;
        let value: serde_json::Value = serde_json::from_str(&ready)
            .map_err(|e| anyhow!("unexpected startup line from interpreter: {}", e))?;
        if value.get("status").and_then(|v| v.as_str()) != Some("ready") {
            bail!("unexpected startup reply: {}", ready);
        }

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines,
            next_id: 0,
            alive: true,
            _bootstrap: bootstrap,
        })
    }

    /// Whether the kernel can still accept cells. A timed-out or exited
    /// interpreter is not trusted with further requests.
    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Execute one cell's source, capturing its streams and any exception.
    pub async fn execute(&mut self, code: &str, limit: Duration) -> Result<super::CellOutcome> {
        if !self.alive {
            bail!("kernel is no longer alive");
        }
        self.next_id += 1;
        let id = self.next_id;

        let request = serde_json::to_string(&CellRequest { id, code })?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("kernel stdin is closed"))?;
        stdin.write_all(request.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;

        let read = match time::timeout(limit, self.lines.next_line()).await {
            Err(_) => {
                self.alive = false;
                self.child.start_kill().ok();
                return Ok(super::CellOutcome {
                    error: Some(super::KernelError {
                        ename: "CellTimeoutError".to_string(),
                        evalue: format!("cell execution exceeded {}s", limit.as_secs()),
                        traceback: Vec::new(),
                    }),
                    ..Default::default()
                });
            }
            Ok(read) => read?,
        };
        let Some(line) = read else {
            self.alive = false;
            bail!("kernel exited before replying");
        };

        let reply: CellReply =
            serde_json::from_str(&line).map_err(|e| anyhow!("malformed kernel reply: {}", e))?;
        if reply.id != id {
            self.alive = false;
            bail!("kernel reply out of order (expected {}, got {})", id, reply.id);
        }

        let error = if reply.status == "error" {
            Some(super::KernelError {
                ename: reply.ename.unwrap_or_else(|| "Exception".to_string()),
                evalue: reply.evalue.unwrap_or_default(),
                traceback: reply.traceback,
            })
        } else {
            None
        };
        Ok(super::CellOutcome {
            stdout: reply.stdout,
            stderr: reply.stderr,
            error,
        })
    }

    /// Close stdin so the bootstrap loop ends, then reap the child.
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.stdin.take());
        match time::timeout(SHUTDOWN_TIMEOUT, self.child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                self.child.kill().await.ok();
            }
        }
        Ok(())
    }
}
