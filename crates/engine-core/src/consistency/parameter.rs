use crate::consistency::context::CalculationContext;
use connectors::sql::base::{adapter::DatabaseType, source::PipelineDataSource};
use model::core::{identifiers::TableName, value::Value};
use std::{fmt, sync::Arc};

/// Everything one calculation session needs for a single table on one side
/// (source or target). Owned by that session; reused across chunk calls.
pub struct DataConsistencyCalculateParameter {
    pub table: TableName,
    /// Columns to read; empty means all.
    pub column_names: Vec<String>,
    pub unique_key: Option<String>,
    /// Last unique-key value already processed. `None` before the first chunk.
    pub checkpoint: Option<Value>,
    /// Inclusive end of the unique-key range to scan.
    pub upper_bound: Option<Value>,
    pub data_source: Arc<dyn PipelineDataSource>,
    pub calculation_context: Option<CalculationContext>,
}

impl DataConsistencyCalculateParameter {
    pub fn new(table: impl Into<TableName>, data_source: Arc<dyn PipelineDataSource>) -> Self {
        Self {
            table: table.into(),
            column_names: Vec::new(),
            unique_key: None,
            checkpoint: None,
            upper_bound: None,
            data_source,
            calculation_context: None,
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unique_key(mut self, unique_key: impl Into<String>) -> Self {
        self.unique_key = Some(unique_key.into());
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Value) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_upper_bound(mut self, upper_bound: Value) -> Self {
        self.upper_bound = Some(upper_bound);
        self
    }

    pub fn database_type(&self) -> DatabaseType {
        self.data_source.database_type()
    }

    /// Closes and discards the calculation context, if any.
    pub async fn close_context(&mut self) {
        if let Some(mut context) = self.calculation_context.take() {
            context.close().await;
        }
    }
}

impl fmt::Debug for DataConsistencyCalculateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataConsistencyCalculateParameter")
            .field("table", &self.table)
            .field("column_names", &self.column_names)
            .field("unique_key", &self.unique_key)
            .field("checkpoint", &self.checkpoint)
            .field("upper_bound", &self.upper_bound)
            .field("database_type", &self.data_source.database_type())
            .field("context_open", &self.calculation_context.is_some())
            .finish()
    }
}
