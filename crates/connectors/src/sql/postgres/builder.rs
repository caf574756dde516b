use crate::sql::base::{adapter::DatabaseType, builder::PipelineSqlBuilder};
use model::core::identifiers::TableName;

/// Dialect for PostgreSQL and openGauss. Has no CRC32 aggregate.
#[derive(Debug, Clone)]
pub struct PostgresSqlBuilder {
    database_type: DatabaseType,
}

impl PostgresSqlBuilder {
    pub fn new(database_type: DatabaseType) -> Self {
        Self { database_type }
    }
}

impl Default for PostgresSqlBuilder {
    fn default() -> Self {
        Self::new(DatabaseType::Postgres)
    }
}

impl PipelineSqlBuilder for PostgresSqlBuilder {
    fn database_type(&self) -> DatabaseType {
        self.database_type.clone()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', r#""""#))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn build_crc32_sql(&self, _table: &TableName, _column: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::base::builder::QueryRange;
    use model::core::value::Value;

    #[test]
    fn test_resumed_chunk_uses_numbered_placeholders() {
        let (sql, params) = PostgresSqlBuilder::default().build_chunked_query_sql(
            &TableName::with_schema("public", "t_order"),
            &["order_id".to_string()],
            "order_id",
            &QueryRange::after(Some(Value::Int(5)), Some(Value::Int(50))),
        );
        assert_eq!(
            sql,
            r#"SELECT "order_id" FROM "public"."t_order" WHERE "order_id" > $1 AND "order_id" <= $2 ORDER BY "order_id" ASC"#
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_no_checksum_support() {
        assert!(
            PostgresSqlBuilder::default()
                .build_crc32_sql(&TableName::new("t"), "c")
                .is_none()
        );
    }
}
