// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{MapReduceError, Result};
use crate::partitioner::PartitionStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How files are sized across map workers
    pub partition_strategy: PartitionStrategy,
    /// Deadline for all map workers to report in milliseconds (0 = no timeout)
    pub map_timeout_ms: u64,
    /// Deadline for all group workers to report in milliseconds (0 = no timeout)
    pub group_timeout_ms: u64,
    /// Directory relative file names are resolved against
    pub base_dir: PathBuf,
    /// How many words the result summary lists
    pub top_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partition_strategy: PartitionStrategy::Even,
            map_timeout_ms: 300_000,
            group_timeout_ms: 300_000,
            base_dir: PathBuf::from("."),
            top_words: 20,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |source: Box<dyn std::error::Error + Send + Sync>| MapReduceError::Config {
            path: path.to_path_buf(),
            source,
        };
        let contents = fs::read_to_string(path).map_err(|e| config_error(Box::new(e)))?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| config_error(Box::new(e)))?;
        Ok(config)
    }
}

/// Units of concurrency available to this process
pub fn available_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Accepts `0 < requested <= available`
pub fn validate_worker_count(requested: usize, available: usize) -> Result<usize> {
    if requested == 0 || requested > available {
        return Err(MapReduceError::InvalidWorkerCount {
            requested,
            available,
        });
    }
    Ok(requested)
}
