use crate::sql::{
    base::adapter::DatabaseType, mysql::builder::MySqlSqlBuilder,
    postgres::builder::PostgresSqlBuilder,
};
use model::core::{identifiers::TableName, value::Value};

/// Unique-key window for one ordered scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRange {
    /// Scan start; `None` scans from the beginning of the table.
    pub lower: Option<Value>,
    /// Whether the scan start is itself included.
    pub lower_inclusive: bool,
    /// Inclusive scan end; `None` scans to the end of the table.
    pub upper: Option<Value>,
}

impl QueryRange {
    /// Resumes strictly after `checkpoint`, as the chunked row scan does.
    pub fn after(checkpoint: Option<Value>, upper: Option<Value>) -> Self {
        Self {
            lower: checkpoint,
            lower_inclusive: false,
            upper,
        }
    }
}

/// Produces the dialect-specific SQL the consistency algorithms execute.
pub trait PipelineSqlBuilder: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    /// Wraps an identifier in the dialect's quotation marks.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Parameter placeholder for the zero-based `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Aggregate query returning `(checksum, row count)` for one column, or
    /// `None` if the dialect has no checksum function.
    fn build_crc32_sql(&self, table: &TableName, column: &str) -> Option<String>;

    fn quote_table(&self, table: &TableName) -> String {
        match &table.schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(&table.table)
            ),
            None => self.quote_identifier(&table.table),
        }
    }

    /// Ordered scan over `unique_key` restricted to `range`. Returns the SQL and
    /// the values to bind, in placeholder order. Empty `columns` selects all.
    fn build_chunked_query_sql(
        &self,
        table: &TableName,
        columns: &[String],
        unique_key: &str,
        range: &QueryRange,
    ) -> (String, Vec<Value>) {
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let key = self.quote_identifier(unique_key);

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(lower) = &range.lower {
            let op = if range.lower_inclusive { ">=" } else { ">" };
            conditions.push(format!("{key} {op} {}", self.placeholder(params.len())));
            params.push(lower.clone());
        }
        if let Some(upper) = &range.upper {
            conditions.push(format!("{key} <= {}", self.placeholder(params.len())));
            params.push(upper.clone());
        }

        let mut sql = format!("SELECT {projection} FROM {}", self.quote_table(table));
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {key} ASC"));
        (sql, params)
    }
}

/// Builder for the given database family; `None` for families without a dialect.
pub fn sql_builder_for(database_type: &DatabaseType) -> Option<Box<dyn PipelineSqlBuilder>> {
    match database_type {
        DatabaseType::MySql => Some(Box::new(MySqlSqlBuilder)),
        DatabaseType::Postgres | DatabaseType::OpenGauss => {
            Some(Box::new(PostgresSqlBuilder::new(database_type.clone())))
        }
        DatabaseType::Other(_) => None,
    }
}
