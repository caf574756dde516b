use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Opening a connection failed.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Column index {index} out of range for row with {len} columns")]
    ColumnIndex { index: usize, len: usize },

    /// A driver value could not be normalized.
    #[error("Cannot convert column '{column}': {message}")]
    Conversion { column: String, message: String },

    #[error("Unsupported column type '{type_name}' for column '{column}'")]
    UnsupportedType { column: String, type_name: String },

    /// The connection or cursor was already closed or handed to a cursor.
    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening during data source or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("MySQL URL error: {0}")]
    MySqlUrl(#[from] mysql_async::UrlError),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Unsupported database type: {0}")]
    UnsupportedDatabase(String),
}
