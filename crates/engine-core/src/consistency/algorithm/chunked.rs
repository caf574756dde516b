use crate::{
    consistency::{
        algorithm::StreamingCalculateAlgorithm, parameter::DataConsistencyCalculateParameter,
    },
    error::ConsistencyError,
};
use futures::{Stream, stream};
use std::mem;

enum ChunkState<R> {
    Fresh,
    ChunkReady(R),
    Exhausted,
    Failed,
}

/// Single-pass, lazily computed sequence of chunk results.
///
/// `has_next` computes the next chunk at most once and caches it until `next`
/// takes it. Exhaustion and failure are terminal.
pub struct ChunkedResults<'a, A: StreamingCalculateAlgorithm> {
    algorithm: &'a A,
    param: &'a mut DataConsistencyCalculateParameter,
    state: ChunkState<A::Output>,
}

impl<'a, A: StreamingCalculateAlgorithm> ChunkedResults<'a, A> {
    pub fn new(algorithm: &'a A, param: &'a mut DataConsistencyCalculateParameter) -> Self {
        Self {
            algorithm,
            param,
            state: ChunkState::Fresh,
        }
    }

    pub async fn has_next(&mut self) -> Result<bool, ConsistencyError> {
        match self.state {
            ChunkState::ChunkReady(_) => Ok(true),
            ChunkState::Exhausted | ChunkState::Failed => Ok(false),
            ChunkState::Fresh => match self.algorithm.calculate_chunk(self.param).await {
                Ok(Some(result)) => {
                    self.state = ChunkState::ChunkReady(result);
                    Ok(true)
                }
                Ok(None) => {
                    self.state = ChunkState::Exhausted;
                    Ok(false)
                }
                Err(err) => {
                    self.state = ChunkState::Failed;
                    Err(err)
                }
            },
        }
    }

    pub async fn next(&mut self) -> Result<Option<A::Output>, ConsistencyError> {
        if !self.has_next().await? {
            return Ok(None);
        }
        match mem::replace(&mut self.state, ChunkState::Fresh) {
            ChunkState::ChunkReady(result) => Ok(Some(result)),
            other => {
                self.state = other;
                Ok(None)
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ChunkState::Exhausted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ChunkState::Failed)
    }

    /// Adapts the sequence into a stream that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<A::Output, ConsistencyError>> + 'a {
        stream::try_unfold(self, |mut chunks| async move {
            Ok(chunks.next().await?.map(|result| (result, chunks)))
        })
    }
}
