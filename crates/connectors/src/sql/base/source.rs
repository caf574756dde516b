use crate::sql::base::{adapter::DatabaseType, error::DbError, row::DbRow};
use async_trait::async_trait;
use model::core::value::Value;

/// A database the consistency algorithms can open connections against.
#[async_trait]
pub trait PipelineDataSource: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    async fn connect(&self) -> Result<Box<dyn PipelineConnection>, DbError>;
}

/// A single live connection.
#[async_trait]
pub trait PipelineConnection: Send {
    /// Runs `sql` and returns its first row, if any.
    async fn query_first(&mut self, sql: &str, params: &[Value]) -> Result<Option<DbRow>, DbError>;

    /// Starts a streaming read. The connection stays busy until the cursor is closed.
    async fn open_cursor(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Box<dyn RowCursor>, DbError>;

    async fn close(&mut self) -> Result<(), DbError>;
}

/// Forward-only row stream over one statement.
#[async_trait]
pub trait RowCursor: Send {
    /// `None` once the result set is exhausted.
    async fn next_row(&mut self) -> Result<Option<DbRow>, DbError>;

    async fn close(&mut self) -> Result<(), DbError>;
}
