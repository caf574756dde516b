use crate::{
    consistency::{
        algorithm::{DataConsistencyCalculateAlgorithm, SingleCalculateAlgorithm},
        parameter::DataConsistencyCalculateParameter,
        result::ChecksumCalculatedResult,
    },
    error::ConsistencyError,
};
use async_trait::async_trait;
use connectors::sql::base::{
    adapter::DatabaseType,
    builder::sql_builder_for,
    error::DbError,
    reader::{StandardValueReader, ValueReader},
    source::PipelineConnection,
};
use model::core::{identifiers::TableName, value::Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const CRC32_MATCH: &str = "CRC32_MATCH";

/// Whole-table comparison via per-column `BIT_XOR(CRC32(col))` aggregates.
/// Cheap but not resumable.
#[derive(Debug)]
pub struct Crc32MatchAlgorithm {
    canceling: AtomicBool,
    supported_database_types: Vec<DatabaseType>,
}

impl Crc32MatchAlgorithm {
    pub fn new() -> Self {
        Self::with_supported_database_types(vec![DatabaseType::MySql])
    }

    pub fn with_supported_database_types(supported_database_types: Vec<DatabaseType>) -> Self {
        Self {
            canceling: AtomicBool::new(false),
            supported_database_types,
        }
    }

    async fn calculate_columns(
        &self,
        connection: &mut dyn PipelineConnection,
        table: &TableName,
        statements: &[String],
    ) -> Result<ChecksumCalculatedResult, ConsistencyError> {
        let reader = StandardValueReader;
        let mut records_count = None;
        let mut column_checksums = Vec::with_capacity(statements.len());

        for sql in statements {
            if self.is_canceling() {
                info!(%table, "CRC32 calculation canceled");
                return Err(ConsistencyError::canceled(table));
            }

            let row = connection
                .query_first(sql, &[])
                .await
                .map_err(|e| ConsistencyError::loading(table, e))?
                .ok_or_else(|| {
                    ConsistencyError::loading(
                        table,
                        DbError::Unknown("checksum query returned no row".into()),
                    )
                })?;

            let checksum = reader
                .read(&row, 0)
                .and_then(|v| to_u64("checksum", v))
                .map_err(|e| ConsistencyError::loading(table, e))?;
            column_checksums.push(checksum);

            if records_count.is_none() {
                let count = reader
                    .read(&row, 1)
                    .and_then(|v| to_u64("cnt", v))
                    .map_err(|e| ConsistencyError::loading(table, e))?;
                records_count = Some(count);
            }
        }

        Ok(ChecksumCalculatedResult {
            records_count: records_count.unwrap_or(0),
            column_checksums,
        })
    }
}

impl Default for Crc32MatchAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

/// `BIT_XOR` over an empty table yields 0, some servers report NULL instead.
fn to_u64(column: &str, value: Value) -> Result<u64, DbError> {
    if value.is_null() {
        return Ok(0);
    }
    value.as_u64().ok_or_else(|| DbError::Conversion {
        column: column.to_string(),
        message: format!("expected an unsigned integer, got {value}"),
    })
}

impl DataConsistencyCalculateAlgorithm for Crc32MatchAlgorithm {
    type Output = ChecksumCalculatedResult;

    fn algorithm_type(&self) -> &'static str {
        CRC32_MATCH
    }

    fn supported_database_types(&self) -> Vec<DatabaseType> {
        self.supported_database_types.clone()
    }

    fn cancel(&self) {
        self.canceling.store(true, Ordering::SeqCst);
    }

    fn is_canceling(&self) -> bool {
        self.canceling.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SingleCalculateAlgorithm for Crc32MatchAlgorithm {
    async fn calculate(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<Vec<ChecksumCalculatedResult>, ConsistencyError> {
        let database_type = param.database_type();
        if !self.supported_database_types.contains(&database_type) {
            return Err(ConsistencyError::Unsupported(format!(
                "{CRC32_MATCH} does not support database type {database_type}"
            )));
        }
        if param.column_names.is_empty() {
            return Err(ConsistencyError::Unsupported(format!(
                "{CRC32_MATCH} requires at least one column for table {}",
                param.table
            )));
        }
        let builder = sql_builder_for(&database_type).ok_or_else(|| {
            ConsistencyError::Unsupported(format!("No SQL builder for database type {database_type}"))
        })?;
        let statements = param
            .column_names
            .iter()
            .map(|column| {
                builder.build_crc32_sql(&param.table, column).ok_or_else(|| {
                    ConsistencyError::Unsupported(format!(
                        "{database_type} cannot build a CRC32 checksum query"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(table = %param.table, columns = statements.len(), "Calculating CRC32 checksums");

        let mut connection = param
            .data_source
            .connect()
            .await
            .map_err(|e| ConsistencyError::loading(&param.table, e))?;
        let result = self
            .calculate_columns(connection.as_mut(), &param.table, &statements)
            .await;
        if let Err(error) = connection.close().await {
            warn!(table = %param.table, %error, "Failed to close checksum connection");
        }

        Ok(vec![result?])
    }
}
