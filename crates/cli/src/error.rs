use connectors::sql::base::error::{ConnectorError, DbError};
use engine_core::error::ConsistencyError;
use model::execution::properties::PropertiesError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to write the report: {0}")]
    ReportWrite(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid connection format provided: {0}")]
    InvalidConnectionFormat(String),

    #[error("Invalid table argument: {0}")]
    InvalidTable(String),

    #[error("Invalid algorithm properties: {0}")]
    Properties(#[from] PropertiesError),

    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Consistency check failed: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
