// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::{validate_worker_count, Config};
use crate::error::Result;
use crate::orchestrator::RunOptions;
use crate::partitioner::PartitionStrategy;
use crate::types::GroupingMode;
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Arguments shared by every runtime binary
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Number of workers per phase, at most the available parallelism
    pub num_cores: usize,

    /// `true` groups through a second worker pool, `false` folds inline
    #[arg(action = ArgAction::Set)]
    pub parallel_group: bool,

    /// Corpus files, relative paths resolve against the base directory
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory relative file names are resolved against
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// How files are sized across map workers
    #[arg(long, value_enum)]
    pub partition: Option<PartitionStrategy>,

    /// Per-phase deadline in milliseconds (0 = no timeout)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    /// Loads the configuration file if given, then applies flag overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(base_dir) = &self.base_dir {
            config.base_dir = base_dir.clone();
        }
        if let Some(strategy) = self.partition {
            config.partition_strategy = strategy;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.map_timeout_ms = timeout_ms;
            config.group_timeout_ms = timeout_ms;
        }
        Ok(config)
    }

    /// Validates the worker count against `available` units of concurrency
    pub fn run_options(&self, config: &Config, available: usize) -> Result<RunOptions> {
        let num_workers = validate_worker_count(self.num_cores, available)?;
        Ok(RunOptions::new(
            num_workers,
            GroupingMode::from_flag(self.parallel_group),
            config,
        ))
    }
}
