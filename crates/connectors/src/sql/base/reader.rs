use crate::sql::{
    base::{error::DbError, row::DbRow},
    mysql, postgres,
};
use model::core::value::Value;

/// Converts one column of a driver row into a normalized `Value`.
pub trait ValueReader: Send + Sync {
    fn read(&self, row: &DbRow, index: usize) -> Result<Value, DbError>;

    fn read_all(&self, row: &DbRow) -> Result<Vec<Value>, DbError> {
        (0..row.len()).map(|index| self.read(row, index)).collect()
    }
}

/// Reader covering the MySQL and PostgreSQL drivers plus in-memory rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardValueReader;

impl ValueReader for StandardValueReader {
    fn read(&self, row: &DbRow, index: usize) -> Result<Value, DbError> {
        if index >= row.len() {
            return Err(DbError::ColumnIndex {
                index,
                len: row.len(),
            });
        }
        match row {
            DbRow::MySqlRow(row) => mysql::value::read_value(row, index),
            DbRow::PostgresRow(row) => postgres::value::read_value(row, index),
            DbRow::Values { values, .. } => Ok(values[index].clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_column() {
        let row = DbRow::from_values(vec!["id".into()], vec![Value::Int(7)]);
        let reader = StandardValueReader;
        assert_eq!(reader.read(&row, 0).unwrap(), Value::Int(7));
        assert!(matches!(
            reader.read(&row, 3),
            Err(DbError::ColumnIndex { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_read_all_preserves_order() {
        let row = DbRow::from_values(
            vec!["a".into(), "b".into()],
            vec![Value::from("x"), Value::Null],
        );
        assert_eq!(
            StandardValueReader.read_all(&row).unwrap(),
            vec![Value::from("x"), Value::Null]
        );
    }
}
