// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::aggregation::AggregationMap;
use crate::error::{MapReduceError, Result};
use crate::partitioner::{contiguous_slices, partition, PartitionStrategy};
use crate::reducer::reduce_all;
use crate::types::{Assignment, FinalCounts, GroupedCounts, GroupingMode, Phase, WordCount};
use rand::Rng;
use std::mem;
use std::path::PathBuf;
use tracing::debug;

/// Phases a run moves through, in order
///
/// `GroupInline` and `GroupDispatched -> GroupCollected` are the two
/// alternative grouping paths out of `MapCollected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Partitioned,
    MapDispatched,
    MapCollected,
    GroupInline,
    GroupDispatched,
    GroupCollected,
    Reduced,
    Done,
}

/// Counts completions for one phase and rejects repeats
#[derive(Debug)]
struct PhaseBarrier {
    phase: Phase,
    reported: Vec<bool>,
    completed: usize,
}

impl PhaseBarrier {
    fn new(phase: Phase, num_workers: usize) -> Self {
        Self {
            phase,
            reported: vec![false; num_workers],
            completed: 0,
        }
    }

    /// Records a completion, returns true once every worker has reported
    fn record(&mut self, worker_id: usize) -> Result<bool> {
        let phase = self.phase;
        let slot = self
            .reported
            .get_mut(worker_id)
            .ok_or(MapReduceError::UnknownWorker { phase, worker_id })?;
        if *slot {
            return Err(MapReduceError::DuplicateCompletion { phase, worker_id });
        }
        *slot = true;
        self.completed += 1;
        Ok(self.completed == self.reported.len())
    }
}

/// Phase state of a single run
///
/// Owns the collected tuples, the completion counters and the aggregation map.
/// Every inbound message is handled through `&mut self`, one at a time.
#[derive(Debug)]
pub struct Coordinator {
    state: PipelineState,
    num_workers: usize,
    grouping: GroupingMode,
    map_barrier: PhaseBarrier,
    group_barrier: PhaseBarrier,
    tuples: Vec<WordCount>,
    aggregation: AggregationMap,
}

impl Coordinator {
    pub fn new(num_workers: usize, grouping: GroupingMode) -> Self {
        Self {
            state: PipelineState::Idle,
            num_workers,
            grouping,
            map_barrier: PhaseBarrier::new(Phase::Map, num_workers),
            group_barrier: PhaseBarrier::new(Phase::Group, num_workers),
            tuples: Vec::new(),
            aggregation: AggregationMap::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn grouping(&self) -> GroupingMode {
        self.grouping
    }

    pub fn map_completed(&self) -> usize {
        self.map_barrier.completed
    }

    pub fn group_completed(&self) -> usize {
        self.group_barrier.completed
    }

    pub fn completed(&self, phase: Phase) -> usize {
        match phase {
            Phase::Map => self.map_completed(),
            Phase::Group => self.group_completed(),
        }
    }

    pub fn tuples_collected(&self) -> usize {
        self.tuples.len()
    }

    pub fn aggregation(&self) -> &AggregationMap {
        &self.aggregation
    }

    /// Idle -> Partitioned: one assignment per worker slot
    pub fn partition(
        &mut self,
        files: Vec<PathBuf>,
        strategy: PartitionStrategy,
        rng: &mut impl Rng,
    ) -> Result<Vec<Assignment>> {
        self.expect_state(&[PipelineState::Idle], PipelineState::Partitioned)?;
        let assignments = partition(files, self.num_workers, strategy, rng)?;
        debug!(
            sizes = ?assignments.iter().map(Vec::len).collect::<Vec<_>>(),
            "Files per worker"
        );
        self.state = PipelineState::Partitioned;
        Ok(assignments)
    }

    /// Partitioned -> MapDispatched
    pub fn map_dispatched(&mut self) -> Result<()> {
        self.transition(&[PipelineState::Partitioned], PipelineState::MapDispatched)
    }

    /// Takes one map worker's tuples, returns true when this completion crossed
    /// the map barrier (MapDispatched -> MapCollected)
    pub fn accept_map_result(&mut self, worker_id: usize, tuples: Vec<WordCount>) -> Result<bool> {
        self.expect_state(&[PipelineState::MapDispatched], PipelineState::MapCollected)?;
        let all_reported = self.map_barrier.record(worker_id)?;
        self.tuples.extend(tuples);

        if all_reported {
            self.state = PipelineState::MapCollected;
        }
        Ok(all_reported)
    }

    /// MapCollected -> GroupInline: folds every collected tuple on the spot
    pub fn group_inline(&mut self) -> Result<()> {
        self.transition(&[PipelineState::MapCollected], PipelineState::GroupInline)?;
        let tuples = mem::take(&mut self.tuples);
        self.aggregation.fold_tuples(tuples);
        Ok(())
    }

    /// MapCollected -> GroupDispatched: hands back one contiguous slice of the
    /// collected tuples per group worker
    pub fn dispatch_group(&mut self) -> Result<Vec<Vec<WordCount>>> {
        self.transition(&[PipelineState::MapCollected], PipelineState::GroupDispatched)?;
        let tuples = mem::take(&mut self.tuples);
        Ok(contiguous_slices(tuples, self.num_workers))
    }

    /// Merges one group worker's partial result, returns true when this
    /// completion crossed the group barrier (GroupDispatched -> GroupCollected)
    pub fn accept_group_result(&mut self, worker_id: usize, partial: GroupedCounts) -> Result<bool> {
        self.expect_state(
            &[PipelineState::GroupDispatched],
            PipelineState::GroupCollected,
        )?;
        let all_reported = self.group_barrier.record(worker_id)?;
        self.aggregation.merge_partial(partial);

        if all_reported {
            self.state = PipelineState::GroupCollected;
        }
        Ok(all_reported)
    }

    /// GroupInline | GroupCollected -> Reduced
    pub fn reduce(&mut self) -> Result<FinalCounts> {
        self.transition(
            &[PipelineState::GroupInline, PipelineState::GroupCollected],
            PipelineState::Reduced,
        )?;
        Ok(reduce_all(mem::take(&mut self.aggregation)))
    }

    /// Reduced -> Done
    pub fn finish(&mut self) -> Result<()> {
        self.transition(&[PipelineState::Reduced], PipelineState::Done)
    }

    fn transition(&mut self, from: &[PipelineState], to: PipelineState) -> Result<()> {
        self.expect_state(from, to)?;
        self.state = to;
        Ok(())
    }

    fn expect_state(&self, from: &[PipelineState], to: PipelineState) -> Result<()> {
        if from.contains(&self.state) {
            Ok(())
        } else {
            Err(MapReduceError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn files(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn tuples(pairs: &[(&str, u64)]) -> Vec<WordCount> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    fn collected(grouping: GroupingMode) -> Coordinator {
        let mut rng = StdRng::seed_from_u64(1);
        let mut coordinator = Coordinator::new(2, grouping);
        coordinator
            .partition(files(&["a.txt", "b.txt"]), PartitionStrategy::Even, &mut rng)
            .unwrap();
        coordinator.map_dispatched().unwrap();
        assert!(!coordinator
            .accept_map_result(1, tuples(&[("b", 1), ("c", 1)]))
            .unwrap());
        assert!(coordinator
            .accept_map_result(0, tuples(&[("a", 2), ("b", 1)]))
            .unwrap());
        coordinator
    }

    #[test]
    fn test_map_barrier_crosses_at_k_of_k_in_any_order() {
        let coordinator = collected(GroupingMode::Inline);
        assert_eq!(coordinator.state(), PipelineState::MapCollected);
        assert_eq!(coordinator.map_completed(), 2);
        assert_eq!(coordinator.completed(Phase::Map), coordinator.num_workers());
        assert_eq!(coordinator.completed(Phase::Group), 0);
        assert_eq!(coordinator.tuples_collected(), 4);
    }

    #[test]
    fn test_inline_path_reaches_done() {
        let mut coordinator = collected(GroupingMode::Inline);
        coordinator.group_inline().unwrap();
        assert_eq!(coordinator.state(), PipelineState::GroupInline);

        let counts = coordinator.reduce().unwrap();
        coordinator.finish().unwrap();

        assert_eq!(coordinator.state(), PipelineState::Done);
        assert_eq!(counts["a"], 2);
        assert_eq!(counts["b"], 2);
        assert_eq!(counts["c"], 1);
    }

    #[test]
    fn test_parallel_path_merges_partials() {
        let mut coordinator = collected(GroupingMode::Parallel);
        let slices = coordinator.dispatch_group().unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices.iter().map(Vec::len).sum::<usize>(), 4);

        assert!(!coordinator
            .accept_group_result(1, vec![("b".to_string(), vec![1])])
            .unwrap());
        assert!(coordinator
            .accept_group_result(
                0,
                vec![("a".to_string(), vec![2]), ("b".to_string(), vec![1])]
            )
            .unwrap());
        assert_eq!(coordinator.state(), PipelineState::GroupCollected);
        assert_eq!(coordinator.aggregation().get("b"), Some(&[1, 1][..]));

        let counts = coordinator.reduce().unwrap();
        assert_eq!(counts["b"], 2);
    }

    #[test]
    fn test_duplicate_completion_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut coordinator = Coordinator::new(2, GroupingMode::Inline);
        coordinator
            .partition(files(&["a.txt", "b.txt"]), PartitionStrategy::Even, &mut rng)
            .unwrap();
        coordinator.map_dispatched().unwrap();
        coordinator.accept_map_result(0, Vec::new()).unwrap();

        let result = coordinator.accept_map_result(0, Vec::new());
        assert!(matches!(
            result,
            Err(MapReduceError::DuplicateCompletion {
                phase: Phase::Map,
                worker_id: 0
            })
        ));
        assert_eq!(coordinator.map_completed(), 1);
        assert_eq!(coordinator.state(), PipelineState::MapDispatched);
    }

    #[test]
    fn test_unknown_worker_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut coordinator = Coordinator::new(1, GroupingMode::Inline);
        coordinator
            .partition(files(&["a.txt"]), PartitionStrategy::Even, &mut rng)
            .unwrap();
        coordinator.map_dispatched().unwrap();

        let result = coordinator.accept_map_result(3, Vec::new());
        assert!(matches!(
            result,
            Err(MapReduceError::UnknownWorker { worker_id: 3, .. })
        ));
    }

    #[test]
    fn test_completion_after_barrier_is_rejected() {
        let mut coordinator = collected(GroupingMode::Inline);
        let result = coordinator.accept_map_result(0, Vec::new());
        assert!(matches!(
            result,
            Err(MapReduceError::InvalidTransition {
                from: PipelineState::MapCollected,
                ..
            })
        ));
    }

    #[test]
    fn test_reduce_before_grouping_is_rejected() {
        let mut coordinator = collected(GroupingMode::Inline);
        assert!(matches!(
            coordinator.reduce(),
            Err(MapReduceError::InvalidTransition {
                from: PipelineState::MapCollected,
                to: PipelineState::Reduced
            })
        ));
    }

    #[test]
    fn test_partition_failure_keeps_idle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut coordinator = Coordinator::new(3, GroupingMode::Inline);
        let result = coordinator.partition(files(&["a.txt"]), PartitionStrategy::Even, &mut rng);
        assert!(matches!(result, Err(MapReduceError::NotEnoughFiles { .. })));
        assert_eq!(coordinator.state(), PipelineState::Idle);
    }
}
