use crate::sql::{
    base::{adapter::DatabaseType, error::ConnectorError, source::PipelineDataSource},
    mysql::source::MySqlPipelineDataSource,
    postgres::source::PgPipelineDataSource,
};
use std::sync::Arc;

/// Builds the data source for `database_type` from a connection URL.
pub fn data_source(
    database_type: &DatabaseType,
    url: &str,
) -> Result<Arc<dyn PipelineDataSource>, ConnectorError> {
    match database_type {
        DatabaseType::MySql => Ok(Arc::new(MySqlPipelineDataSource::new(url)?)),
        DatabaseType::Postgres | DatabaseType::OpenGauss => Ok(Arc::new(
            PgPipelineDataSource::with_database_type(url, database_type.clone())?,
        )),
        DatabaseType::Other(name) => Err(ConnectorError::UnsupportedDatabase(name.clone())),
    }
}

/// Infers the database type from the URL scheme (`mysql://`, `postgres://`, `opengauss://`).
pub fn database_type_from_url(url: &str) -> Result<DatabaseType, ConnectorError> {
    let (scheme, _) = url
        .split_once("://")
        .ok_or_else(|| ConnectorError::InvalidUrl(format!("missing scheme in '{url}'")))?;
    match scheme.parse::<DatabaseType>() {
        Ok(DatabaseType::Other(name)) => Err(ConnectorError::UnsupportedDatabase(name)),
        Ok(database_type) => Ok(database_type),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_from_url() {
        assert_eq!(
            database_type_from_url("mysql://root@localhost:3306/db").unwrap(),
            DatabaseType::MySql
        );
        assert_eq!(
            database_type_from_url("postgresql://u@h/db").unwrap(),
            DatabaseType::Postgres
        );
        assert!(matches!(
            database_type_from_url("ftp://host"),
            Err(ConnectorError::UnsupportedDatabase(_))
        ));
        assert!(matches!(
            database_type_from_url("localhost"),
            Err(ConnectorError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_database_is_rejected() {
        let result = data_source(&DatabaseType::Other("oracle".into()), "oracle://h");
        assert!(matches!(result, Err(ConnectorError::UnsupportedDatabase(_))));
    }

    #[tokio::test]
    async fn test_mysql_data_source_is_lazy() {
        // Pool creation does not dial the server.
        let source = data_source(&DatabaseType::MySql, "mysql://root:pw@127.0.0.1:3306/db").unwrap();
        assert_eq!(source.database_type(), DatabaseType::MySql);
    }
}
