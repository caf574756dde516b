use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

/// Database family a data source talks to. Algorithms declare which ones they support.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    MySql,
    Postgres,
    OpenGauss,
    Other(String),
}

impl DatabaseType {
    /// Whether the PostgreSQL wire protocol and SQL dialect apply.
    pub fn is_postgres_like(&self) -> bool {
        matches!(self, DatabaseType::Postgres | DatabaseType::OpenGauss)
    }
}

impl FromStr for DatabaseType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => DatabaseType::MySql,
            "pg" | "postgres" | "postgresql" => DatabaseType::Postgres,
            "opengauss" => DatabaseType::OpenGauss,
            other => DatabaseType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::MySql => f.write_str("MySQL"),
            DatabaseType::Postgres => f.write_str("PostgreSQL"),
            DatabaseType::OpenGauss => f.write_str("openGauss"),
            DatabaseType::Other(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("MariaDB".parse::<DatabaseType>().unwrap(), DatabaseType::MySql);
        assert_eq!("pg".parse::<DatabaseType>().unwrap(), DatabaseType::Postgres);
        assert_eq!(
            "openGauss".parse::<DatabaseType>().unwrap(),
            DatabaseType::OpenGauss
        );
        assert_eq!(
            "oracle".parse::<DatabaseType>().unwrap(),
            DatabaseType::Other("oracle".into())
        );
    }

    #[test]
    fn test_postgres_family() {
        assert!(DatabaseType::OpenGauss.is_postgres_like());
        assert!(!DatabaseType::MySql.is_postgres_like());
    }
}
