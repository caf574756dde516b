use crate::{
    core::{identifiers::TableName, value::Value},
    records::position::Position,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub value: Value,
    pub primary_key: bool,
    pub unique_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            primary_key: false,
            unique_key: false,
        }
    }

    /// Marks the column as part of the primary key (which is also unique).
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique_key = true;
        self
    }

    pub fn unique_key(mut self) -> Self {
        self.unique_key = true;
        self
    }
}

/// One captured row change as handed over by the capture layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    position: Position,
    csn: Option<u64>,
    table_name: TableName,
    change_type: ChangeType,
    columns: Vec<Column>,
}

impl DataRecord {
    pub fn new(change_type: ChangeType, table_name: impl Into<TableName>, position: Position) -> Self {
        Self {
            position,
            csn: None,
            table_name: table_name.into(),
            change_type,
            columns: Vec::new(),
        }
    }

    pub fn with_csn(mut self, csn: u64) -> Self {
        self.csn = Some(csn);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn csn(&self) -> Option<u64> {
        self.csn
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn unique_key_values(&self) -> Vec<&Value> {
        self.columns
            .iter()
            .filter(|c| c.unique_key)
            .map(|c| &c.value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_insert() -> DataRecord {
        DataRecord::new(
            ChangeType::Insert,
            "t_order",
            Position::binlog("mysql-bin.000001", 120),
        )
        .with_csn(7)
        .with_column(Column::new("order_id", 1).primary_key())
        .with_column(Column::new("status", "OK"))
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let record = order_insert();
        assert_eq!(
            record.column("STATUS").map(|c| &c.value),
            Some(&Value::String("OK".into()))
        );
        assert!(record.column("missing").is_none());
    }

    #[test]
    fn test_unique_key_values_follow_column_order() {
        let record = order_insert();
        assert_eq!(record.unique_key_values(), vec![&Value::Int32(1)]);
        assert_eq!(record.csn(), Some(7));
        assert_eq!(record.table_name().to_string(), "t_order");
    }
}
