// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::wire::{read_line, write_line, WireError};
use crate::WORKER_COMMAND;
use async_trait::async_trait;
use map_reduce_core::completion_signaling::CompletionSender;
use map_reduce_core::error::{MapReduceError, Result};
use map_reduce_core::types::Phase;
use map_reduce_core::worker::{Worker, WorkerResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

const EXIT_GRACE: Duration = Duration::from_secs(1);

/// Worker backed by a child process running `<program> worker <role>`,
/// fed one JSON line on stdin and replying with one JSON line on stdout
pub struct ProcessWorker<A, O> {
    worker_id: usize,
    role: Phase,
    child: Child,
    exchange: Option<JoinHandle<()>>,
    _phantom: PhantomData<fn(A) -> O>,
}

impl<A, O> ProcessWorker<A, O> {
    pub fn spawn(worker_id: usize, role: Phase, program: &Path, base_dir: &Path) -> Result<Self> {
        let role_arg = match role {
            Phase::Map => "map",
            Phase::Group => "group",
        };
        let mut command = Command::new(program);
        command
            .arg(WORKER_COMMAND)
            .arg(role_arg)
            .arg("--base-dir")
            .arg(base_dir);
        Self::start(worker_id, role, command)
    }

    fn start(worker_id: usize, role: Phase, mut command: Command) -> Result<Self> {
        let child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MapReduceError::WorkerSpawn { worker_id, source })?;
        debug!(phase = %role, worker_id, pid = ?child.id(), "Worker process started");

        Ok(Self {
            worker_id,
            role,
            child,
            exchange: None,
            _phantom: PhantomData,
        })
    }
}

async fn request<A, O>(stdin: ChildStdin, stdout: ChildStdout, assignment: A) -> WorkerResult<O>
where
    A: Serialize + Sync,
    O: DeserializeOwned,
{
    let reply: std::result::Result<WorkerResult<O>, WireError> = async {
        write_line(stdin, &assignment).await?;
        read_line(stdout).await
    }
    .await;
    reply.unwrap_or_else(|e| Err(format!("worker process: {}", e)))
}

#[async_trait]
impl<A, O> Worker for ProcessWorker<A, O>
where
    A: Serialize + Send + Sync + 'static,
    O: DeserializeOwned + Send + 'static,
{
    type Assignment = A;
    type Output = O;

    fn send_work(&mut self, assignment: A, completion: CompletionSender<O>) -> Result<()> {
        let dispatch_error = MapReduceError::Dispatch {
            phase: self.role,
            worker_id: self.worker_id,
        };
        let (Some(stdin), Some(stdout)) = (self.child.stdin.take(), self.child.stdout.take()) else {
            return Err(dispatch_error);
        };

        let role = self.role;
        self.exchange = Some(tokio::spawn(async move {
            let worker_id = completion.worker_id();
            let result = request(stdin, stdout, assignment).await;
            if !completion.send(result).await {
                debug!(phase = %role, worker_id, "Coordinator stopped listening");
            }
        }));
        Ok(())
    }

    async fn terminate(mut self) {
        let replied = self.exchange.take().is_some_and(|exchange| {
            let finished = exchange.is_finished();
            exchange.abort();
            finished
        });

        if replied {
            if let Ok(Ok(status)) = timeout(EXIT_GRACE, self.child.wait()).await {
                debug!(phase = %self.role, worker_id = self.worker_id, %status, "Worker process exited");
                return;
            }
        }
        if let Err(e) = self.child.kill().await {
            warn!(phase = %self.role, worker_id = self.worker_id, error = %e, "Failed to kill worker process");
        }
    }
}
