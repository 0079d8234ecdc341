// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::Result;

/// Trait for creating workers
pub trait WorkerFactory<W>: Send {
    fn create_worker(&mut self, id: usize) -> Result<W>;
}

impl<F, W> WorkerFactory<W> for F
where
    F: FnMut(usize) -> Result<W> + Send,
{
    fn create_worker(&mut self, id: usize) -> Result<W> {
        (self)(id)
    }
}
