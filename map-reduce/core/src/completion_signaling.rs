// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::worker::WorkerResult;
use tokio::sync::mpsc::{self, Sender};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{StreamExt, StreamMap};

/// Sender a worker uses to report its single result
pub struct CompletionSender<O> {
    worker_id: usize,
    tx: Sender<WorkerResult<O>>,
}

impl<O: Send> CompletionSender<O> {
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Reports the result, returns false if the coordinator stopped listening
    pub async fn send(self, result: WorkerResult<O>) -> bool {
        self.tx.send(result).await.is_ok()
    }
}

/// Channel-based completion signaling using tokio mpsc and StreamMap
///
/// Every worker slot gets its own channel, so a message is attributed to the
/// worker owning the channel rather than to anything in its payload. The
/// signaling keeps no sender of its own: a worker that drops its sender
/// without reporting simply disappears from the map.
pub struct ChannelCompletionSignaling<O> {
    completion_txs: Vec<Option<Sender<WorkerResult<O>>>>,
    completion_streams: StreamMap<usize, ReceiverStream<WorkerResult<O>>>,
}

impl<O: Send + 'static> ChannelCompletionSignaling<O> {
    /// Setup completion signaling for N workers
    pub fn setup(num_workers: usize) -> Self {
        let mut completion_txs = Vec::with_capacity(num_workers);
        let mut completion_streams = StreamMap::new();

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel::<WorkerResult<O>>(1);
            completion_txs.push(Some(tx));
            completion_streams.insert(worker_id, ReceiverStream::new(rx));
        }

        Self {
            completion_txs,
            completion_streams,
        }
    }

    /// Hands out the sender for a worker slot, at most once
    pub fn take_sender(&mut self, worker_id: usize) -> Option<CompletionSender<O>> {
        self.completion_txs
            .get_mut(worker_id)
            .and_then(Option::take)
            .map(|tx| CompletionSender { worker_id, tx })
    }

    /// Stops listening to a worker slot
    pub fn remove(&mut self, worker_id: usize) {
        self.completion_streams.remove(&worker_id);
    }

    /// Wait for the next worker to report
    /// Returns None once every worker has reported or dropped its sender
    pub async fn wait_next(&mut self) -> Option<(usize, WorkerResult<O>)> {
        self.completion_streams.next().await
    }
}
