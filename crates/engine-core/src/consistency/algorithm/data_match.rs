use crate::{
    consistency::{
        algorithm::{DataConsistencyCalculateAlgorithm, StreamingCalculateAlgorithm},
        context::CalculationContext,
        parameter::DataConsistencyCalculateParameter,
        result::DataMatchCalculatedResult,
    },
    error::ConsistencyError,
};
use async_trait::async_trait;
use connectors::sql::base::{
    adapter::DatabaseType,
    builder::{QueryRange, sql_builder_for},
    reader::{StandardValueReader, ValueReader},
};
use model::{
    core::{identifiers::TableName, value::Value},
    execution::properties::AlgorithmProperties,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info, warn};

pub const DATA_MATCH: &str = "DATA_MATCH";
pub const CHUNK_SIZE_KEY: &str = "chunk-size";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Row-by-row comparison over an ordered unique-key scan, in chunks of
/// `chunk-size` rows. Resumable from the last chunk's checkpoint.
pub struct DataMatchAlgorithm {
    chunk_size: usize,
    canceling: AtomicBool,
    value_reader: Arc<dyn ValueReader>,
}

impl DataMatchAlgorithm {
    pub fn new(props: &AlgorithmProperties) -> Self {
        Self {
            chunk_size: chunk_size_from(props),
            canceling: AtomicBool::new(false),
            value_reader: Arc::new(StandardValueReader),
        }
    }

    pub fn with_value_reader(mut self, value_reader: Arc<dyn ValueReader>) -> Self {
        self.value_reader = value_reader;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn open_context(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<(), ConsistencyError> {
        let unique_key = unique_key(param)?;
        let database_type = param.database_type();
        if !self.supported_database_types().contains(&database_type) {
            return Err(ConsistencyError::Unsupported(format!(
                "{DATA_MATCH} does not support database type {database_type}"
            )));
        }
        let builder = sql_builder_for(&database_type).ok_or_else(|| {
            ConsistencyError::Unsupported(format!("No SQL builder for database type {database_type}"))
        })?;

        let columns = selected_columns(&param.column_names, &unique_key);
        let range = QueryRange::after(param.checkpoint.clone(), param.upper_bound.clone());
        let (sql, params) =
            builder.build_chunked_query_sql(&param.table, &columns, &unique_key, &range);
        debug!(table = %param.table, %sql, "Opening row match cursor");

        let context = CalculationContext::open(param.data_source.as_ref(), &sql, &params)
            .await
            .map_err(|e| ConsistencyError::loading(&param.table, e))?;
        param.calculation_context = Some(context);
        Ok(())
    }

    fn check_canceled(&self, table: &TableName) -> Result<(), ConsistencyError> {
        if self.is_canceling() {
            info!(%table, "Row match calculation canceled");
            return Err(ConsistencyError::canceled(table));
        }
        Ok(())
    }

    async fn read_chunk(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<Option<DataMatchCalculatedResult>, ConsistencyError> {
        self.check_canceled(&param.table)?;
        if param.calculation_context.is_none() {
            self.open_context(param).await?;
        }
        let unique_key = unique_key(param)?;
        let table = param.table.clone();
        let Some(context) = param.calculation_context.as_mut() else {
            return Err(ConsistencyError::Unsupported(format!(
                "No calculation context for table {table}"
            )));
        };

        let mut records = Vec::with_capacity(self.chunk_size.min(DEFAULT_CHUNK_SIZE));
        let mut max_unique_key_value = None;
        let mut key_index = None;

        while records.len() < self.chunk_size {
            self.check_canceled(&table)?;
            let row = match context.next_row().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(ConsistencyError::loading(&table, e)),
            };
            self.check_canceled(&table)?;

            let index = match key_index {
                Some(index) => index,
                None => {
                    let index = row.column_index(&unique_key).ok_or_else(|| {
                        ConsistencyError::Unsupported(format!(
                            "Unique key {unique_key} is not part of the result of table {table}"
                        ))
                    })?;
                    key_index = Some(index);
                    index
                }
            };

            let values = self
                .value_reader
                .read_all(&row)
                .map_err(|e| ConsistencyError::loading(&table, e))?
                .into_iter()
                .map(Value::normalized)
                .collect::<Vec<_>>();
            max_unique_key_value = values.get(index).cloned();
            records.push(values);
        }

        if records.is_empty() {
            return Ok(None);
        }

        param.checkpoint = max_unique_key_value.clone();
        Ok(Some(DataMatchCalculatedResult::new(
            max_unique_key_value,
            records,
        )))
    }
}

fn unique_key(param: &DataConsistencyCalculateParameter) -> Result<String, ConsistencyError> {
    param.unique_key.clone().ok_or_else(|| {
        ConsistencyError::Unsupported(format!(
            "{DATA_MATCH} requires a unique key, table {} has none",
            param.table
        ))
    })
}

/// The scan must return the unique key to track the checkpoint.
fn selected_columns(columns: &[String], unique_key: &str) -> Vec<String> {
    if columns.is_empty() || columns.iter().any(|c| c.eq_ignore_ascii_case(unique_key)) {
        return columns.to_vec();
    }
    let mut selected = Vec::with_capacity(columns.len() + 1);
    selected.push(unique_key.to_string());
    selected.extend(columns.iter().cloned());
    selected
}

fn chunk_size_from(props: &AlgorithmProperties) -> usize {
    match props.parse::<i64>(CHUNK_SIZE_KEY) {
        None => DEFAULT_CHUNK_SIZE,
        Some(Ok(size)) if size > 0 => size as usize,
        Some(Ok(size)) => {
            warn!(
                chunk_size = size,
                "Invalid chunk-size, must be positive. Using default {DEFAULT_CHUNK_SIZE}"
            );
            DEFAULT_CHUNK_SIZE
        }
        Some(Err(error)) => {
            warn!(
                raw = props.get(CHUNK_SIZE_KEY).unwrap_or_default(),
                %error,
                "Invalid chunk-size, not an integer. Using default {DEFAULT_CHUNK_SIZE}"
            );
            DEFAULT_CHUNK_SIZE
        }
    }
}

impl DataConsistencyCalculateAlgorithm for DataMatchAlgorithm {
    type Output = DataMatchCalculatedResult;

    fn algorithm_type(&self) -> &'static str {
        DATA_MATCH
    }

    fn supported_database_types(&self) -> Vec<DatabaseType> {
        vec![
            DatabaseType::MySql,
            DatabaseType::Postgres,
            DatabaseType::OpenGauss,
        ]
    }

    fn cancel(&self) {
        self.canceling.store(true, Ordering::SeqCst);
    }

    fn is_canceling(&self) -> bool {
        self.canceling.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamingCalculateAlgorithm for DataMatchAlgorithm {
    async fn calculate_chunk(
        &self,
        param: &mut DataConsistencyCalculateParameter,
    ) -> Result<Option<DataMatchCalculatedResult>, ConsistencyError> {
        let result = self.read_chunk(param).await;
        match &result {
            Ok(Some(chunk)) => {
                debug!(table = %param.table, rows = chunk.records().len(), "Calculated chunk");
            }
            Ok(None) => {
                debug!(table = %param.table, "Table exhausted");
                param.close_context().await;
            }
            Err(error) => {
                warn!(table = %param.table, %error, "Chunk calculation failed");
                param.close_context().await;
            }
        }
        result
    }
}
