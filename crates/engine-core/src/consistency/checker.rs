use crate::{
    consistency::{
        algorithm::{
            SingleCalculateAlgorithm, StreamingCalculateAlgorithm, chunked::ChunkedResults,
        },
        factory::AlgorithmKind,
        parameter::DataConsistencyCalculateParameter,
        result::CalculatedResult,
    },
    error::ConsistencyError,
};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountCheckResult {
    pub source: u64,
    pub target: u64,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentCheckResult {
    pub matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataConsistencyCheckResult {
    pub count: CountCheckResult,
    pub content: ContentCheckResult,
}

impl DataConsistencyCheckResult {
    pub fn is_matched(&self) -> bool {
        self.count.matched && self.content.matched
    }
}

/// Source and target parameters for one table.
pub struct TableCheckTask {
    pub source: DataConsistencyCalculateParameter,
    pub target: DataConsistencyCalculateParameter,
}

/// Compares source and target tables with one algorithm. Clones share the
/// algorithm, so `cancel` on any clone stops every running check.
#[derive(Clone)]
pub struct DataConsistencyChecker {
    algorithm: Arc<AlgorithmKind>,
}

impl DataConsistencyChecker {
    pub fn new(algorithm: AlgorithmKind) -> Self {
        Self {
            algorithm: Arc::new(algorithm),
        }
    }

    pub fn algorithm(&self) -> &AlgorithmKind {
        &self.algorithm
    }

    pub fn cancel(&self) {
        self.algorithm.cancel();
    }

    pub async fn check(
        &self,
        source: &mut DataConsistencyCalculateParameter,
        target: &mut DataConsistencyCalculateParameter,
    ) -> Result<DataConsistencyCheckResult, ConsistencyError> {
        check_with(&self.algorithm, source, target).await
    }

    /// Checks every table in its own task. Results are keyed by source table name.
    pub async fn check_tables(
        &self,
        tasks: Vec<TableCheckTask>,
    ) -> Result<BTreeMap<String, DataConsistencyCheckResult>, ConsistencyError> {
        let mut set = JoinSet::new();
        for TableCheckTask {
            mut source,
            mut target,
        } in tasks
        {
            let algorithm = Arc::clone(&self.algorithm);
            set.spawn(async move {
                let name = source.table.to_string();
                let result = check_with(&algorithm, &mut source, &mut target).await;
                (name, result)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let (name, result) = joined.map_err(|e| ConsistencyError::Task(e.to_string()))?;
            results.insert(name, result?);
        }
        Ok(results)
    }
}

async fn check_with(
    algorithm: &AlgorithmKind,
    source: &mut DataConsistencyCalculateParameter,
    target: &mut DataConsistencyCalculateParameter,
) -> Result<DataConsistencyCheckResult, ConsistencyError> {
    info!(
        table = %source.table,
        algorithm = algorithm.algorithm_type(),
        "Checking data consistency"
    );
    let result = match algorithm {
        AlgorithmKind::Crc32Match(a) => check_single(a, source, target).await,
        AlgorithmKind::DataMatch(a) => check_streaming(a, source, target).await,
    }?;
    info!(
        table = %source.table,
        source_count = result.count.source,
        target_count = result.count.target,
        matched = result.is_matched(),
        "Data consistency check finished"
    );
    Ok(result)
}

async fn check_single<A: SingleCalculateAlgorithm>(
    algorithm: &A,
    source: &mut DataConsistencyCalculateParameter,
    target: &mut DataConsistencyCalculateParameter,
) -> Result<DataConsistencyCheckResult, ConsistencyError> {
    let (source_results, target_results) =
        tokio::try_join!(algorithm.calculate(source), algorithm.calculate(target))?;

    let mut result = DataConsistencyCheckResult::default();
    result.count.source = source_results.iter().map(|r| r.records_count()).sum();
    result.count.target = target_results.iter().map(|r| r.records_count()).sum();
    result.count.matched = result.count.source == result.count.target;
    result.content.matched = source_results == target_results;
    Ok(result)
}

async fn check_streaming<A: StreamingCalculateAlgorithm>(
    algorithm: &A,
    source: &mut DataConsistencyCalculateParameter,
    target: &mut DataConsistencyCalculateParameter,
) -> Result<DataConsistencyCheckResult, ConsistencyError> {
    let outcome = {
        let mut source_chunks = algorithm.calculate(source);
        let mut target_chunks = algorithm.calculate(target);
        compare_chunks(&mut source_chunks, &mut target_chunks).await
    };

    // A mismatch or a one-sided error leaves the other scan open.
    source.close_context().await;
    target.close_context().await;
    outcome
}

async fn compare_chunks<A: StreamingCalculateAlgorithm>(
    source_chunks: &mut ChunkedResults<'_, A>,
    target_chunks: &mut ChunkedResults<'_, A>,
) -> Result<DataConsistencyCheckResult, ConsistencyError> {
    let mut result = DataConsistencyCheckResult {
        content: ContentCheckResult { matched: true },
        ..Default::default()
    };

    loop {
        let (source_chunk, target_chunk) =
            tokio::try_join!(source_chunks.next(), target_chunks.next())?;
        if source_chunk.is_none() && target_chunk.is_none() {
            break;
        }

        result.count.source += source_chunk.as_ref().map_or(0, |c| c.records_count());
        result.count.target += target_chunk.as_ref().map_or(0, |c| c.records_count());
        if source_chunk != target_chunk {
            warn!(
                checkpoint = ?source_chunk.as_ref().and_then(|c| c.checkpoint()),
                "Content mismatch, stopping check"
            );
            result.content.matched = false;
            break;
        }
    }

    result.count.matched = result.count.source == result.count.target;
    Ok(result)
}
