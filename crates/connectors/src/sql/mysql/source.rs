use crate::sql::{
    base::{
        adapter::DatabaseType,
        error::{ConnectorError, DbError},
        row::DbRow,
        source::{PipelineConnection, PipelineDataSource, RowCursor},
    },
    mysql::params::MySqlParamStore,
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use model::core::value::Value;
use mysql_async::{Conn, Opts, Params, Pool, Row as MySqlRow, prelude::Queryable};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace};

/// Rows buffered between the streaming task and the cursor consumer.
const CURSOR_BUFFER: usize = 256;

#[derive(Clone)]
pub struct MySqlPipelineDataSource {
    pool: Pool,
}

impl MySqlPipelineDataSource {
    pub fn new(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url)?;
        Ok(MySqlPipelineDataSource {
            pool: Pool::new(opts),
        })
    }

    pub async fn disconnect(self) -> Result<(), ConnectorError> {
        self.pool.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl PipelineDataSource for MySqlPipelineDataSource {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    async fn connect(&self) -> Result<Box<dyn PipelineConnection>, DbError> {
        let conn = self.pool.get_conn().await?;
        debug!(connection_id = conn.id(), "Opened MySQL connection");
        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }
}

/// Pooled connection. Opening a cursor hands the underlying `Conn` to the
/// streaming task, after which the connection only accepts `close`.
pub struct MySqlConnection {
    conn: Option<Conn>,
}

impl MySqlConnection {
    fn conn(&mut self) -> Result<&mut Conn, DbError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbError::Closed("MySQL connection is closed or streaming".into()))
    }
}

#[async_trait]
impl PipelineConnection for MySqlConnection {
    async fn query_first(&mut self, sql: &str, params: &[Value]) -> Result<Option<DbRow>, DbError> {
        let store = MySqlParamStore::from_values(params);
        let row: Option<MySqlRow> = self.conn()?.exec_first(sql, store.params()).await?;
        Ok(row.map(DbRow::MySqlRow))
    }

    async fn open_cursor(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Box<dyn RowCursor>, DbError> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| DbError::Closed("MySQL connection is closed or streaming".into()))?;
        let params = MySqlParamStore::from_values(params).params();
        let (tx, rx) = mpsc::channel(CURSOR_BUFFER);
        let task = tokio::spawn(stream_rows(conn, sql.to_string(), params, tx));

        Ok(Box::new(MySqlRowCursor {
            rows: rx,
            task: Some(task),
        }))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        // Dropping a pooled `Conn` hands it back to the pool.
        self.conn.take();
        Ok(())
    }
}

async fn stream_rows(
    mut conn: Conn,
    sql: String,
    params: Params,
    tx: mpsc::Sender<Result<DbRow, DbError>>,
) {
    let result: Result<(), mysql_async::Error> = async {
        let mut stream = conn
            .exec_stream::<MySqlRow, _, _>(sql.as_str(), params)
            .await?;
        while let Some(row) = stream.try_next().await? {
            if tx.send(Ok(DbRow::MySqlRow(row))).await.is_err() {
                trace!("MySQL cursor closed before the result set was drained");
                break;
            }
        }
        Ok(())
    }
    .await;

    if let Err(err) = result {
        let _ = tx.send(Err(err.into())).await;
    }
}

pub struct MySqlRowCursor {
    rows: mpsc::Receiver<Result<DbRow, DbError>>,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl RowCursor for MySqlRowCursor {
    async fn next_row(&mut self) -> Result<Option<DbRow>, DbError> {
        if self.task.is_none() {
            return Err(DbError::Closed("MySQL cursor is closed".into()));
        }
        self.rows.recv().await.transpose()
    }

    async fn close(&mut self) -> Result<(), DbError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        self.rows.close();
        task.await
            .map_err(|e| DbError::Unknown(format!("MySQL cursor task failed: {e}")))
    }
}
