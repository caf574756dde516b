use model::core::value::Value;
use mysql_async::Row as MySqlRow;
use std::fmt;
use tokio_postgres::Row as PgRow;

/// One row as returned by a cursor. Driver rows stay undecoded until a
/// `ValueReader` materializes the columns the caller asks for.
pub enum DbRow {
    MySqlRow(MySqlRow),
    PostgresRow(PgRow),
    /// Already-normalized row, used by in-memory sources.
    Values {
        columns: Vec<String>,
        values: Vec<Value>,
    },
}

impl DbRow {
    pub fn from_values(columns: Vec<String>, values: Vec<Value>) -> Self {
        DbRow::Values { columns, values }
    }

    pub fn len(&self) -> usize {
        match self {
            DbRow::MySqlRow(row) => row.len(),
            DbRow::PostgresRow(row) => row.len(),
            DbRow::Values { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        match self {
            DbRow::MySqlRow(row) => row
                .columns_ref()
                .iter()
                .map(|col| col.name_str().into_owned())
                .collect(),
            DbRow::PostgresRow(row) => row
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect(),
            DbRow::Values { columns, .. } => columns.clone(),
        }
    }

    /// Case-insensitive position of `name` among the row's columns.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names()
            .iter()
            .position(|col| col.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for DbRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbRow::MySqlRow(row) => write!(f, "{row:?}"),
            DbRow::PostgresRow(row) => write!(f, "{row:?}"),
            DbRow::Values { columns, values } => f
                .debug_struct("Values")
                .field("columns", columns)
                .field("values", values)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_row_lookup() {
        let row = DbRow::from_values(
            vec!["order_id".into(), "Status".into()],
            vec![Value::Int(1), Value::from("OK")],
        );
        assert_eq!(row.len(), 2);
        assert_eq!(row.column_index("status"), Some(1));
        assert_eq!(row.column_index("missing"), None);
    }
}
