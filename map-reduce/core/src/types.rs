// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// A word and its frequency within one map worker's files
pub type WordCount = (String, u64);

/// Files handed to a single map worker
pub type Assignment = Vec<PathBuf>;

/// Partial result of a group worker, one entry per word
pub type GroupedCounts = Vec<(String, Vec<u64>)>;

/// Total occurrences of every word in the corpus
pub type FinalCounts = HashMap<String, u64>;

/// Worker phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Phase {
    Map,
    Group,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Map => write!(f, "Map"),
            Phase::Group => write!(f, "Group"),
        }
    }
}

/// How collected tuples are turned into word -> counts entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Fold every tuple into the aggregation map on the coordinator
    #[default]
    Inline,
    /// Re-slice the tuples and fan them out to a second worker pool
    Parallel,
}

impl GroupingMode {
    pub fn from_flag(parallel: bool) -> Self {
        if parallel {
            GroupingMode::Parallel
        } else {
            GroupingMode::Inline
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingMode::Inline => write!(f, "inline"),
            GroupingMode::Parallel => write!(f, "parallel"),
        }
    }
}
