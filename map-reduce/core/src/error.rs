// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::coordinator::PipelineState;
use crate::types::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring or running a word-count pipeline
#[derive(Debug, Error)]
pub enum MapReduceError {
    #[error("Number of cores must be greater than 0 and less than or equal to {available}, got {requested}")]
    InvalidWorkerCount { requested: usize, available: usize },

    #[error("Cannot split {files} file(s) across {workers} worker(s)")]
    NotEnoughFiles { files: usize, workers: usize },

    #[error("{phase} phase timed out with {completed} of {expected} worker(s) reported")]
    WorkerTimeout {
        phase: Phase,
        completed: usize,
        expected: usize,
    },

    #[error("{phase} worker {worker_id} failed: {reason}")]
    WorkerFailed {
        phase: Phase,
        worker_id: usize,
        reason: String,
    },

    #[error("{phase} workers disconnected with {completed} of {expected} worker(s) reported")]
    WorkersDisconnected {
        phase: Phase,
        completed: usize,
        expected: usize,
    },

    #[error("Failed to start worker {worker_id}")]
    WorkerSpawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deliver {phase} assignment to worker {worker_id}")]
    Dispatch { phase: Phase, worker_id: usize },

    #[error("Invalid pipeline transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("{phase} worker {worker_id} reported more than once")]
    DuplicateCompletion { phase: Phase, worker_id: usize },

    #[error("{phase} completion from unknown worker {worker_id}")]
    UnknownWorker { phase: Phase, worker_id: usize },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Failed to load configuration from {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, MapReduceError>;
