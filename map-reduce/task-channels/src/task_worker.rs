// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use map_reduce_core::completion_signaling::CompletionSender;
use map_reduce_core::error::{MapReduceError, Result};
use map_reduce_core::types::Phase;
use map_reduce_core::worker::{Worker, WorkerResult};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The work a task runs for one assignment
#[async_trait]
pub trait TaskJob: Send + Sync + 'static {
    type Assignment: Send + 'static;
    type Output: Send + 'static;

    const PHASE: Phase;

    async fn run(&self, assignment: Self::Assignment) -> WorkerResult<Self::Output>;
}

type WorkMessage<J> = (
    <J as TaskJob>::Assignment,
    CompletionSender<<J as TaskJob>::Output>,
);

/// Worker backed by a tokio task fed over an mpsc channel
pub struct TaskWorker<J: TaskJob> {
    worker_id: usize,
    work_tx: Sender<WorkMessage<J>>,
    shutdown: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl<J: TaskJob> TaskWorker<J> {
    pub fn spawn(worker_id: usize, job: J) -> Self {
        let (work_tx, work_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let task_handle = tokio::spawn(run_task(worker_id, job, work_rx, shutdown.clone()));

        Self {
            worker_id,
            work_tx,
            shutdown,
            task_handle,
        }
    }
}

async fn run_task<J: TaskJob>(
    worker_id: usize,
    job: J,
    mut work_rx: Receiver<WorkMessage<J>>,
    shutdown: CancellationToken,
) {
    loop {
        let (assignment, completion) = tokio::select! {
            work = work_rx.recv() => match work {
                Some(work) => work,
                None => break,
            },
            _ = shutdown.cancelled() => break,
        };

        debug!(phase = %J::PHASE, worker_id, "Task processing assignment");
        let result = tokio::select! {
            result = job.run(assignment) => result,
            _ = shutdown.cancelled() => {
                debug!(phase = %J::PHASE, worker_id, "Task cancelled mid-assignment");
                return;
            }
        };

        if !completion.send(result).await {
            debug!(phase = %J::PHASE, worker_id, "Coordinator stopped listening");
            return;
        }
    }
}

#[async_trait]
impl<J: TaskJob> Worker for TaskWorker<J> {
    type Assignment = J::Assignment;
    type Output = J::Output;

    fn send_work(
        &mut self,
        assignment: Self::Assignment,
        completion: CompletionSender<Self::Output>,
    ) -> Result<()> {
        self.work_tx
            .try_send((assignment, completion))
            .map_err(|_| MapReduceError::Dispatch {
                phase: J::PHASE,
                worker_id: self.worker_id,
            })
    }

    async fn terminate(self) {
        self.shutdown.cancel();
        drop(self.work_tx);
        if let Err(e) = self.task_handle.await {
            warn!(phase = %J::PHASE, worker_id = self.worker_id, error = %e, "Task ended abnormally");
        }
    }
}
