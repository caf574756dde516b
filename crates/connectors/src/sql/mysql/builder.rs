use crate::sql::base::{adapter::DatabaseType, builder::PipelineSqlBuilder};
use model::core::identifiers::TableName;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSqlBuilder;

impl PipelineSqlBuilder for MySqlSqlBuilder {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn build_crc32_sql(&self, table: &TableName, column: &str) -> Option<String> {
        Some(format!(
            "SELECT BIT_XOR(CAST(CRC32({}) AS UNSIGNED)) AS checksum, COUNT(1) AS cnt FROM {}",
            self.quote_identifier(column),
            self.quote_table(table)
        ))
    }
}
