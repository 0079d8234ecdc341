// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::{MapReduceError, Result};
use crate::partitioner::PartitionStrategy;
use crate::phase_executor::{ActivePhase, PhaseExecutor};
use crate::report::RunReport;
use crate::types::{Assignment, FinalCounts, GroupedCounts, GroupingMode, Phase, WordCount};
use crate::worker::Worker;
use crate::worker_factory::WorkerFactory;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run-level settings the orchestrator needs
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub num_workers: usize,
    pub grouping: GroupingMode,
    pub partition_strategy: PartitionStrategy,
    pub map_timeout_ms: u64,
    pub group_timeout_ms: u64,
}

impl RunOptions {
    pub fn new(num_workers: usize, grouping: GroupingMode, config: &Config) -> Self {
        Self {
            num_workers,
            grouping,
            partition_strategy: config.partition_strategy,
            map_timeout_ms: config.map_timeout_ms,
            group_timeout_ms: config.group_timeout_ms,
        }
    }
}

/// Orchestrator drives a word-count run through map, group and reduce
/// Generic over the map and group worker kinds and their factories
pub struct Orchestrator<MW, GW, MF, GF>
where
    MW: Worker<Assignment = Assignment, Output = Vec<WordCount>>,
    GW: Worker<Assignment = Vec<WordCount>, Output = GroupedCounts>,
    MF: WorkerFactory<MW>,
    GF: WorkerFactory<GW>,
{
    options: RunOptions,
    map_executor: PhaseExecutor<MW, MF>,
    group_executor: PhaseExecutor<GW, GF>,
    cancellation_token: CancellationToken,
}

impl<MW, GW, MF, GF> Orchestrator<MW, GW, MF, GF>
where
    MW: Worker<Assignment = Assignment, Output = Vec<WordCount>>,
    GW: Worker<Assignment = Vec<WordCount>, Output = GroupedCounts>,
    MF: WorkerFactory<MW>,
    GF: WorkerFactory<GW>,
{
    pub fn new(options: RunOptions, map_factory: MF, group_factory: GF) -> Self {
        let map_executor = PhaseExecutor::new(Phase::Map, map_factory, options.map_timeout_ms);
        let group_executor =
            PhaseExecutor::new(Phase::Group, group_factory, options.group_timeout_ms);
        Self {
            options,
            map_executor,
            group_executor,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Returns a clone of the cancellation token for external control
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Runs the pipeline and returns the final counts with timing
    pub async fn run(self, files: Vec<PathBuf>) -> Result<RunReport> {
        let num_workers = self.options.num_workers;
        let grouping = self.options.grouping;
        self.run_with(files, |counts, started| {
            RunReport::new(counts, started, num_workers, grouping)
        })
        .await
    }

    /// Runs the pipeline and invokes `on_complete` exactly once with the
    /// final counts and the instant the run started
    pub async fn run_with<R>(
        mut self,
        files: Vec<PathBuf>,
        on_complete: impl FnOnce(FinalCounts, Instant) -> R,
    ) -> Result<R> {
        let started = Instant::now();
        let mut coordinator = Coordinator::new(self.options.num_workers, self.options.grouping);
        info!(
            workers = coordinator.num_workers(),
            grouping = %coordinator.grouping(),
            files = files.len(),
            "Orchestrator started"
        );

        // MAP PHASE
        let assignments =
            coordinator.partition(files, self.options.partition_strategy, &mut rand::rng())?;
        info!(workers = assignments.len(), "Map phase: dispatching assignments");
        let mut mappers = self.map_executor.dispatch(assignments).await?;
        coordinator.map_dispatched()?;

        let outcome = collect(&self.cancellation_token, &mut mappers, |worker_id, tuples| {
            debug!(worker_id, tuples = tuples.len(), "Map worker reported");
            coordinator.accept_map_result(worker_id, tuples)
        })
        .await;
        finish_phase(mappers, outcome).await?;
        info!(
            completed = coordinator.completed(Phase::Map),
            tuples = coordinator.tuples_collected(),
            "Map phase: all workers reported"
        );

        // GROUP PHASE
        match coordinator.grouping() {
            GroupingMode::Inline => {
                coordinator.group_inline()?;
                info!(words = coordinator.aggregation().len(), "Group phase: folded inline");
            }
            GroupingMode::Parallel => {
                let slices = coordinator.dispatch_group()?;
                info!(workers = slices.len(), "Group phase: dispatching slices");
                let mut groupers = self.group_executor.dispatch(slices).await?;

                let outcome = collect(&self.cancellation_token, &mut groupers, |worker_id, partial| {
                    debug!(worker_id, words = partial.len(), "Group worker reported");
                    coordinator.accept_group_result(worker_id, partial)
                })
                .await;
                finish_phase(groupers, outcome).await?;
                info!(
                    completed = coordinator.completed(Phase::Group),
                    words = coordinator.aggregation().len(),
                    "Group phase: all workers reported"
                );
            }
        }

        // REDUCE PHASE
        let counts = coordinator.reduce()?;
        coordinator.finish()?;
        info!(
            words = counts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Orchestrator finished"
        );

        Ok(on_complete(counts, started))
    }
}

/// Terminates whatever is still running in the phase and passes its outcome on
async fn finish_phase<W: Worker>(phase: ActivePhase<W>, outcome: Result<()>) -> Result<()> {
    if let Err(e) = &outcome {
        warn!(
            phase = %phase.phase(),
            received = phase.received(),
            expected = phase.expected(),
            error = %e,
            "Phase aborted"
        );
    }
    phase.shutdown().await;
    outcome
}

/// Feeds completions to `accept` one at a time until it reports the barrier
/// was crossed
async fn collect<W, A>(
    cancellation_token: &CancellationToken,
    phase: &mut ActivePhase<W>,
    mut accept: A,
) -> Result<()>
where
    W: Worker,
    A: FnMut(usize, W::Output) -> Result<bool>,
{
    loop {
        let (worker_id, output) = tokio::select! {
            completion = phase.next_completion() => completion?,
            _ = cancellation_token.cancelled() => return Err(MapReduceError::Cancelled),
        };
        if accept(worker_id, output)? {
            return Ok(());
        }
    }
}
