use connectors::sql::base::{
    error::DbError,
    row::DbRow,
    source::{PipelineConnection, PipelineDataSource, RowCursor},
};
use model::core::value::Value;
use tracing::{debug, warn};

/// The live connection and open cursor behind a chunked calculation.
///
/// Lives in the calculation parameter between chunk calls so that every chunk
/// continues the same scan. Closing is idempotent; failures while closing are
/// logged and swallowed.
pub struct CalculationContext {
    connection: Option<Box<dyn PipelineConnection>>,
    cursor: Option<Box<dyn RowCursor>>,
}

impl CalculationContext {
    /// Connects and opens the cursor. The connection is released if the
    /// cursor cannot be opened.
    pub async fn open(
        data_source: &dyn PipelineDataSource,
        sql: &str,
        params: &[Value],
    ) -> Result<Self, DbError> {
        let mut connection = data_source.connect().await?;
        match connection.open_cursor(sql, params).await {
            Ok(cursor) => Ok(Self::new(connection, cursor)),
            Err(err) => {
                if let Err(close_err) = connection.close().await {
                    warn!(error = %close_err, "Failed to close connection after cursor error");
                }
                Err(err)
            }
        }
    }

    pub fn new(connection: Box<dyn PipelineConnection>, cursor: Box<dyn RowCursor>) -> Self {
        Self {
            connection: Some(connection),
            cursor: Some(cursor),
        }
    }

    pub async fn next_row(&mut self) -> Result<Option<DbRow>, DbError> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.next_row().await,
            None => Err(DbError::Closed("calculation context is closed".into())),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_none() && self.connection.is_none()
    }

    /// Closes the cursor, then the connection.
    pub async fn close(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(error) = cursor.close().await {
                warn!(%error, "Failed to close calculation cursor");
            }
        }
        if let Some(mut connection) = self.connection.take() {
            if let Err(error) = connection.close().await {
                warn!(%error, "Failed to close calculation connection");
            }
            debug!("Calculation context closed");
        }
    }
}
