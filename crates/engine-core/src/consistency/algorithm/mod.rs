use crate::{
    consistency::{parameter::DataConsistencyCalculateParameter, result::CalculatedResult},
    error::ConsistencyError,
};
use async_trait::async_trait;
use chunked::ChunkedResults;
use connectors::sql::base::adapter::DatabaseType;

pub mod chunked;
pub mod crc32;
pub mod data_match;

/// Behaviour shared by every consistency calculation algorithm.
///
/// `Output` ties each algorithm to its own result type, so results of
/// different families can never be compared with each other.
pub trait DataConsistencyCalculateAlgorithm: Send + Sync {
    type Output: CalculatedResult;

    fn algorithm_type(&self) -> &'static str;

    fn supported_database_types(&self) -> Vec<DatabaseType>;

    /// Requests cooperative cancellation of running calculations.
    fn cancel(&self);

    fn is_canceling(&self) -> bool;
}

/// Algorithms that compute everything in one call.
#[async_trait]
pub trait SingleCalculateAlgorithm: DataConsistencyCalculateAlgorithm {
    /// Returns exactly one result.
    async fn calculate(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<Vec<Self::Output>, ConsistencyError>;
}

/// Algorithms that walk a table chunk by chunk.
#[async_trait]
pub trait StreamingCalculateAlgorithm: DataConsistencyCalculateAlgorithm {
    /// Computes the next chunk, advancing `param.checkpoint`. `Ok(None)` once the
    /// table is exhausted. The calculation context is closed whenever this
    /// returns `Ok(None)` or an error.
    async fn calculate_chunk(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<Option<Self::Output>, ConsistencyError>;

    /// Lazy sequence of chunk results for `param`.
    fn calculate<'a>(
        &'a self,
        param: &'a mut DataConsistencyCalculateParameter,
    ) -> ChunkedResults<'a, Self>
    where
        Self: Sized,
    {
        ChunkedResults::new(self, param)
    }
}
