// src/exec/shell.rs

//! Work routine that runs a shell command.
//!
//! Used by the `foreman` binary for plan files. The command runs through
//! `sh -c` (or `cmd /C` on Windows); a non-zero exit becomes the worker's
//! error signal. `stop` kills the child process of the run in progress.

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::errors::Unsupported;
use crate::worker::{Notifier, Work};

pub struct ShellWork {
    cmd: String,
    /// Cancellation for the run in progress; `None` between runs. A stop that
    /// lands before the process is waited on leaves a permit here.
    cancel: Mutex<Option<Arc<Notify>>>,
}

impl ShellWork {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            cancel: Mutex::new(None),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn cancel_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<Notify>>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, worker: &str) -> Result<()> {
        let cancel = Arc::new(Notify::new());
        *self.cancel_slot() = Some(Arc::clone(&cancel));

        let result = self.run_process(worker, &cancel).await;

        let mut slot = self.cancel_slot();
        if slot.as_ref().is_some_and(|c| Arc::ptr_eq(c, &cancel)) {
            *slot = None;
        }
        result
    }

    async fn run_process(&self, worker: &str, cancel: &Notify) -> Result<()> {
        info!(worker, cmd = %self.cmd, "starting process");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for worker '{worker}'"))?;

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let worker = worker.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(worker = %worker, "stderr: {}", line);
                }
            });
        }

        tokio::select! {
            status = child.wait() => {
                let status = status
                    .with_context(|| format!("waiting for process of worker '{worker}'"))?;
                let code = status.code().unwrap_or(-1);
                info!(worker, exit_code = code, success = status.success(), "process exited");
                if status.success() {
                    Ok(())
                } else {
                    Err(anyhow!("command `{}` exited with code {code}", self.cmd))
                }
            }
            _ = cancel.notified() => {
                info!(worker, "stop requested; killing process");
                if let Err(e) = child.kill().await {
                    warn!(worker, error = %e, "failed to kill child process");
                }
                Err(anyhow!("command `{}` was stopped", self.cmd))
            }
        }
    }
}

impl std::fmt::Debug for ShellWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellWork").field("cmd", &self.cmd).finish()
    }
}

impl Work for ShellWork {
    fn work(&self, notifier: &Notifier) -> Result<()> {
        let worker = notifier.worker_id();
        match Handle::try_current() {
            // Pool threads are blocking threads of a tokio runtime.
            Ok(handle) => handle.block_on(self.run(worker)),
            Err(_) => Builder::new_current_thread()
                .enable_all()
                .build()
                .context("building runtime for shell command")?
                .block_on(self.run(worker)),
        }
    }

    /// Kills the current process. Without a run in progress there is nothing
    /// to kill and the request is a no-op.
    fn stop(&self) -> std::result::Result<(), Unsupported> {
        match self.cancel_slot().as_ref() {
            Some(cancel) => cancel.notify_one(),
            None => debug!(cmd = %self.cmd, "stop requested with no process running"),
        }
        Ok(())
    }
}
