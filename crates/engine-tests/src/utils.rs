use crate::memory::{MemoryDataSource, MemoryTable, ScriptedFailure};
use chrono::NaiveDate;
use connectors::sql::base::adapter::DatabaseType;
use engine_core::consistency::parameter::DataConsistencyCalculateParameter;
use model::{
    core::value::Value,
    records::{
        position::Position,
        record::{ChangeType, Column, DataRecord},
    },
};
use std::sync::Arc;

pub const ORDER_TABLE: &str = "t_order";

/// `t_order(order_id, user_id, status, created)` with ids `1..=rows`.
pub fn order_table(rows: i64) -> MemoryTable {
    MemoryTable::new(["order_id", "user_id", "status", "created"], "order_id")
        .with_rows((1..=rows).map(order_row))
}

pub fn order_row(order_id: i64) -> Vec<Value> {
    vec![
        Value::Int(order_id),
        Value::Int32((order_id % 7) as i32),
        Value::from(if order_id % 2 == 0 { "PAID" } else { "NEW" }),
        NaiveDate::from_ymd_opt(2024, 1, (order_id % 28 + 1) as u32)
            .map(Value::Date)
            .unwrap_or(Value::Null),
    ]
}

pub fn memory_source(database_type: DatabaseType, table: MemoryTable) -> Arc<MemoryDataSource> {
    Arc::new(MemoryDataSource::new(database_type, table))
}

pub fn failing_source(
    database_type: DatabaseType,
    table: MemoryTable,
    failure: ScriptedFailure,
) -> Arc<MemoryDataSource> {
    Arc::new(MemoryDataSource::failing(database_type, table, failure))
}

/// Row-match parameter keyed on `order_id`.
pub fn order_param(source: &Arc<MemoryDataSource>) -> DataConsistencyCalculateParameter {
    DataConsistencyCalculateParameter::new(ORDER_TABLE, source.clone()).with_unique_key("order_id")
}

/// Checksum parameter over every `t_order` column.
pub fn checksum_param(source: &Arc<MemoryDataSource>) -> DataConsistencyCalculateParameter {
    DataConsistencyCalculateParameter::new(ORDER_TABLE, source.clone())
        .with_columns(["order_id", "user_id", "status", "created"])
}

/// Insert of one `t_order` row captured at `position`.
pub fn order_insert(order_id: i64, csn: u64, position: Position) -> DataRecord {
    DataRecord::new(ChangeType::Insert, ORDER_TABLE, position)
        .with_csn(csn)
        .with_column(Column::new("order_id", order_id).primary_key())
        .with_column(Column::new("status", "NEW"))
}
