// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod aggregation;
pub mod cli;
pub mod completion_signaling;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod orchestrator;
pub mod partitioner;
pub mod phase_executor;
pub mod reducer;
pub mod report;
pub mod telemetry;
pub mod types;
pub mod worker;
pub mod worker_factory;

pub use error::{MapReduceError, Result};
