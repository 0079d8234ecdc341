// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::task_worker::TaskJob;
use async_trait::async_trait;
use map_reduce_core::types::{Assignment, GroupedCounts, Phase, WordCount};
use map_reduce_core::worker::WorkerResult;
use map_reduce_word_count::{group_tuples, map_files};
use std::path::PathBuf;
use std::sync::Arc;

/// Counts the words of a set of files
pub struct MapJob {
    base_dir: Arc<PathBuf>,
}

impl MapJob {
    pub fn new(base_dir: Arc<PathBuf>) -> Self {
        Self { base_dir }
    }
}

#[async_trait]
impl TaskJob for MapJob {
    type Assignment = Assignment;
    type Output = Vec<WordCount>;

    const PHASE: Phase = Phase::Map;

    async fn run(&self, files: Assignment) -> WorkerResult<Vec<WordCount>> {
        map_files(&self.base_dir, &files).await
    }
}

/// Groups a slice of map tuples by word
pub struct GroupJob;

#[async_trait]
impl TaskJob for GroupJob {
    type Assignment = Vec<WordCount>;
    type Output = GroupedCounts;

    const PHASE: Phase = Phase::Group;

    async fn run(&self, slice: Vec<WordCount>) -> WorkerResult<GroupedCounts> {
        Ok(group_tuples(slice))
    }
}
