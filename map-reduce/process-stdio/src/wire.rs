// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{SinkExt, StreamExt};
use map_reduce_core::types::{Assignment, Phase, WordCount};
use map_reduce_core::worker::WorkerResult;
use map_reduce_word_count::{group_tuples, map_files};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::debug;

/// Failures moving one request or reply across a worker's pipes
#[derive(Debug, Error)]
pub enum WireError {
    #[error("pipe closed before a line arrived")]
    Closed,

    #[error("pipe error: {0}")]
    Codec(#[from] LinesCodecError),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sends one value as a single JSON line
pub async fn write_line<T, W>(writer: W, value: &T) -> Result<(), WireError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedWrite::new(writer, LinesCodec::new());
    lines.send(serde_json::to_string(value)?).await?;
    Ok(())
}

/// Receives one value from a single JSON line
pub async fn read_line<T, R>(reader: R) -> Result<T, WireError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());
    let line = lines.next().await.ok_or(WireError::Closed)??;
    Ok(serde_json::from_str(&line)?)
}

/// Worker side of the protocol: one request in on `input`, one reply out on
/// `output`, then return
pub async fn serve<R, W>(role: Phase, base_dir: &Path, input: R, output: W) -> Result<(), WireError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match role {
        Phase::Map => {
            let files: Assignment = read_line(input).await?;
            debug!(files = files.len(), "Map request received");
            let reply: WorkerResult<Vec<WordCount>> = map_files(base_dir, &files).await;
            write_line(output, &reply).await
        }
        Phase::Group => {
            let slice: Vec<WordCount> = read_line(input).await?;
            debug!(tuples = slice.len(), "Group request received");
            let reply: WorkerResult<_> = Ok(group_tuples(slice));
            write_line(output, &reply).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_reduce_core::types::GroupedCounts;
    use std::fs;
    use tempfile::TempDir;

    async fn exchange<O: DeserializeOwned>(role: Phase, base_dir: &Path, request: &str) -> WorkerResult<O> {
        let mut output = Vec::new();
        serve(role, base_dir, request.as_bytes(), &mut output)
            .await
            .unwrap();
        read_line(output.as_slice()).await.unwrap()
    }

    #[tokio::test]
    async fn test_map_request_replies_with_counts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a b a").unwrap();

        let reply: WorkerResult<Vec<WordCount>> =
            exchange(Phase::Map, dir.path(), "[\"a.txt\"]\n").await;

        assert_eq!(
            reply,
            Ok(vec![("a".to_string(), 2), ("b".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn test_map_request_replies_with_read_failure() {
        let dir = TempDir::new().unwrap();

        let reply: WorkerResult<Vec<WordCount>> =
            exchange(Phase::Map, dir.path(), "[\"nope.txt\"]\n").await;

        assert!(reply.unwrap_err().contains("nope.txt"));
    }

    #[tokio::test]
    async fn test_group_request_replies_with_grouped_counts() {
        let reply: WorkerResult<GroupedCounts> =
            exchange(Phase::Group, Path::new("."), "[[\"b\",1],[\"a\",2],[\"b\",3]]\n").await;

        assert_eq!(
            reply,
            Ok(vec![("a".to_string(), vec![2]), ("b".to_string(), vec![1, 3])])
        );
    }

    #[test]
    fn test_reply_encoding() {
        let ok: WorkerResult<Vec<WordCount>> = Ok(vec![("a".to_string(), 2)]);
        let err: WorkerResult<Vec<WordCount>> = Err("failed to read x".to_string());

        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"Ok":[["a",2]]}"#);
        assert_eq!(serde_json::to_string(&err).unwrap(), r#"{"Err":"failed to read x"}"#);
    }

    #[tokio::test]
    async fn test_empty_input_is_closed() {
        let result: Result<Assignment, WireError> = read_line(&b""[..]).await;
        assert!(matches!(result, Err(WireError::Closed)));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let result: Result<Assignment, WireError> = read_line(&b"{not json\n"[..]).await;
        assert!(matches!(result, Err(WireError::Json(_))));
    }
}
