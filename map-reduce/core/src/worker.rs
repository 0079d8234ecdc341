// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::completion_signaling::CompletionSender;
use crate::error::Result;
use async_trait::async_trait;

/// What a worker reports: its output, or why it could not produce one
pub type WorkerResult<O> = std::result::Result<O, String>;

/// Trait for map and group workers to abstract the unit of concurrency
/// (tokio task, child process, ...)
#[async_trait]
pub trait Worker: Send + 'static {
    type Assignment: Send + 'static;
    type Output: Send + 'static;

    /// Hand over a single assignment and the sender the worker reports on
    fn send_work(
        &mut self,
        assignment: Self::Assignment,
        completion: CompletionSender<Self::Output>,
    ) -> Result<()>;

    /// Stop the worker and release its task or process
    async fn terminate(self);
}
