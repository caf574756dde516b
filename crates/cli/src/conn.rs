use crate::error::CliError;
use async_trait::async_trait;
use connectors::{
    adapter::data_source,
    sql::base::{
        adapter::DatabaseType,
        reader::{StandardValueReader, ValueReader},
    },
};
use tracing::{error, info};

/// Trait for "pinging" a data source
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// Pings any database the connectors crate can open a data source for.
pub struct DataSourcePinger {
    pub database_type: DatabaseType,
    pub conn_str: String,
}

#[async_trait]
impl ConnectionPinger for DataSourcePinger {
    async fn ping(&self) -> Result<(), CliError> {
        info!(database_type = %self.database_type, "Pinging '{}'", &self.conn_str);

        let source = data_source(&self.database_type, &self.conn_str).inspect_err(|e| {
            error!("Connection string '{}' rejected: {}", &self.conn_str, e);
        })?;
        let mut conn = source.connect().await.inspect_err(|e| {
            error!("Connection to '{}' failed: {}", &self.conn_str, e);
        })?;

        let result = conn.query_first("SELECT 1", &[]).await;
        if let Err(e) = conn.close().await {
            error!("Closing connection to '{}' failed: {}", &self.conn_str, e);
        }

        let row = result?.ok_or_else(|| {
            CliError::Unexpected(format!("Ping to '{}' returned no result", &self.conn_str))
        })?;
        let value = StandardValueReader.read(&row, 0)?;
        if value.as_i64() != Some(1) {
            let msg = format!(
                "Ping to '{}' returned unexpected result: {}",
                &self.conn_str, value
            );
            error!("{}", msg);
            return Err(CliError::Unexpected(msg));
        }

        info!("Ping to '{}' succeeded", &self.conn_str);
        Ok(())
    }
}
