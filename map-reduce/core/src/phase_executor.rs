// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::completion_signaling::ChannelCompletionSignaling;
use crate::error::{MapReduceError, Result};
use crate::types::Phase;
use crate::worker::Worker;
use crate::worker_factory::WorkerFactory;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Spawns one worker per assignment for a phase and hands back the
/// in-flight phase to collect completions from
pub struct PhaseExecutor<W, F>
where
    W: Worker,
    F: WorkerFactory<W>,
{
    phase: Phase,
    worker_factory: F,
    timeout: Option<Duration>,
    _phantom: PhantomData<W>,
}

impl<W, F> PhaseExecutor<W, F>
where
    W: Worker,
    F: WorkerFactory<W>,
{
    /// `timeout_ms == 0` waits for workers forever
    pub fn new(phase: Phase, worker_factory: F, timeout_ms: u64) -> Self {
        Self {
            phase,
            worker_factory,
            timeout: if timeout_ms > 0 {
                Some(Duration::from_millis(timeout_ms))
            } else {
                None
            },
            _phantom: PhantomData,
        }
    }

    /// Creates a worker per assignment and sends each its work
    ///
    /// The phase deadline starts once every assignment is out. If any worker
    /// cannot be created or reached, the ones already started are terminated.
    pub async fn dispatch(&mut self, assignments: Vec<W::Assignment>) -> Result<ActivePhase<W>> {
        let expected = assignments.len();
        let mut active = ActivePhase {
            phase: self.phase,
            workers: Vec::with_capacity(expected),
            signaling: ChannelCompletionSignaling::setup(expected),
            deadline: None,
            expected,
            received: 0,
        };

        for (worker_id, assignment) in assignments.into_iter().enumerate() {
            if let Err(e) = self.start_worker(&mut active, worker_id, assignment) {
                active.shutdown().await;
                return Err(e);
            }
        }
        debug!(phase = %self.phase, workers = expected, "Assignments dispatched");

        active.deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        Ok(active)
    }

    fn start_worker(
        &mut self,
        active: &mut ActivePhase<W>,
        worker_id: usize,
        assignment: W::Assignment,
    ) -> Result<()> {
        let mut worker = self.worker_factory.create_worker(worker_id)?;
        let completion = active
            .signaling
            .take_sender(worker_id)
            .ok_or(MapReduceError::Dispatch {
                phase: self.phase,
                worker_id,
            })?;
        let sent = worker.send_work(assignment, completion);
        active.workers.push(Some(worker));
        sent
    }
}

/// A dispatched phase whose workers have not all reported yet
pub struct ActivePhase<W: Worker> {
    phase: Phase,
    workers: Vec<Option<W>>,
    signaling: ChannelCompletionSignaling<W::Output>,
    deadline: Option<Instant>,
    expected: usize,
    received: usize,
}

impl<W: Worker> ActivePhase<W> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Waits for the next worker to report and terminates it
    ///
    /// Fails when the phase deadline passes, when the reporting worker failed,
    /// or when every outstanding worker went away without reporting.
    pub async fn next_completion(&mut self) -> Result<(usize, W::Output)> {
        let next = match self.deadline {
            Some(deadline) => match timeout_at(deadline, self.signaling.wait_next()).await {
                Ok(next) => next,
                Err(_) => {
                    return Err(MapReduceError::WorkerTimeout {
                        phase: self.phase,
                        completed: self.received,
                        expected: self.expected,
                    })
                }
            },
            None => self.signaling.wait_next().await,
        };

        let (worker_id, result) = next.ok_or(MapReduceError::WorkersDisconnected {
            phase: self.phase,
            completed: self.received,
            expected: self.expected,
        })?;
        self.received += 1;

        if let Some(worker) = self.workers.get_mut(worker_id).and_then(Option::take) {
            worker.terminate().await;
        }

        let output = result.map_err(|reason| MapReduceError::WorkerFailed {
            phase: self.phase,
            worker_id,
            reason,
        })?;
        Ok((worker_id, output))
    }

    /// Terminates every worker that has not reported yet
    pub async fn shutdown(mut self) {
        for (worker_id, slot) in self.workers.iter_mut().enumerate() {
            if let Some(worker) = slot.take() {
                warn!(phase = %self.phase, worker_id, "Terminating outstanding worker");
                self.signaling.remove(worker_id);
                worker.terminate().await;
            }
        }
    }
}
