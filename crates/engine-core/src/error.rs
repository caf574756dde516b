use connectors::sql::base::error::DbError;
use model::core::identifiers::TableName;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsistencyError {
    /// The requested calculation cannot run with this configuration.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Unsupported algorithm type: {0}")]
    UnsupportedAlgorithm(String),

    /// Reading data failed or was canceled mid-scan.
    #[error("Failed to load data of table {table}: {cause}")]
    LoadingFailure {
        table: TableName,
        #[source]
        cause: LoadingFailureCause,
    },

    /// A spawned per-table check panicked or was aborted.
    #[error("Check task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum LoadingFailureCause {
    #[error("{0}")]
    Db(#[from] DbError),

    #[error("calculation canceled")]
    Canceled,
}

impl ConsistencyError {
    pub fn loading(table: &TableName, cause: impl Into<LoadingFailureCause>) -> Self {
        ConsistencyError::LoadingFailure {
            table: table.clone(),
            cause: cause.into(),
        }
    }

    pub fn canceled(table: &TableName) -> Self {
        Self::loading(table, LoadingFailureCause::Canceled)
    }

    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            ConsistencyError::LoadingFailure {
                cause: LoadingFailureCause::Canceled,
                ..
            }
        )
    }
}
