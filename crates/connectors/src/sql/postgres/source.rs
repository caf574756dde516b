use crate::sql::{
    base::{
        adapter::DatabaseType,
        error::{ConnectorError, DbError},
        row::DbRow,
        source::{PipelineConnection, PipelineDataSource, RowCursor},
    },
    postgres::{
        params::PgParamStore,
        utils::{connect_client, parse_config},
    },
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use model::core::value::Value;
use std::pin::Pin;
use tokio_postgres::{Client, Config, RowStream};
use tracing::debug;

/// PostgreSQL or openGauss server. Every `connect` opens a fresh client.
#[derive(Clone)]
pub struct PgPipelineDataSource {
    config: Config,
    database_type: DatabaseType,
}

impl PgPipelineDataSource {
    pub fn new(url: &str) -> Result<Self, ConnectorError> {
        Self::with_database_type(url, DatabaseType::Postgres)
    }

    pub fn with_database_type(
        url: &str,
        database_type: DatabaseType,
    ) -> Result<Self, ConnectorError> {
        if !database_type.is_postgres_like() {
            return Err(ConnectorError::UnsupportedDatabase(database_type.to_string()));
        }
        Ok(PgPipelineDataSource {
            config: parse_config(url)?,
            database_type,
        })
    }
}

#[async_trait]
impl PipelineDataSource for PgPipelineDataSource {
    fn database_type(&self) -> DatabaseType {
        self.database_type.clone()
    }

    async fn connect(&self) -> Result<Box<dyn PipelineConnection>, DbError> {
        let client = connect_client(&self.config).await?;
        debug!(database = %self.database_type, "Opened Postgres connection");
        Ok(Box::new(PgConnection {
            client: Some(client),
        }))
    }
}

pub struct PgConnection {
    client: Option<Client>,
}

impl PgConnection {
    fn client(&self) -> Result<&Client, DbError> {
        self.client
            .as_ref()
            .ok_or_else(|| DbError::Closed("Postgres connection is closed".into()))
    }
}

#[async_trait]
impl PipelineConnection for PgConnection {
    async fn query_first(&mut self, sql: &str, params: &[Value]) -> Result<Option<DbRow>, DbError> {
        let client = self.client()?;
        let statement = client.prepare(sql).await?;
        let bindings = PgParamStore::for_statement(params.to_vec(), statement.params());
        let rows = client.query(&statement, &bindings.as_refs()).await?;
        Ok(rows.into_iter().next().map(DbRow::PostgresRow))
    }

    async fn open_cursor(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Box<dyn RowCursor>, DbError> {
        let client = self.client()?;
        let statement = client.prepare(sql).await?;
        let bindings = PgParamStore::for_statement(params.to_vec(), statement.params());
        let stream = client.query_raw(&statement, bindings.as_refs()).await?;

        Ok(Box::new(PgRowCursor {
            stream: Some(Box::pin(stream)),
        }))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        // The spawned connection task ends once the client is dropped.
        self.client.take();
        Ok(())
    }
}

pub struct PgRowCursor {
    stream: Option<Pin<Box<RowStream>>>,
}

#[async_trait]
impl RowCursor for PgRowCursor {
    async fn next_row(&mut self) -> Result<Option<DbRow>, DbError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| DbError::Closed("Postgres cursor is closed".into()))?;
        Ok(stream.try_next().await?.map(DbRow::PostgresRow))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        self.stream.take();
        Ok(())
    }
}
