use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal as RustDecimal;
use std::str::FromStr;
use tokio_postgres::{
    Row as PgRow,
    types::{FromSqlOwned, Type},
};
use uuid::Uuid;

pub(crate) fn read_value(row: &PgRow, index: usize) -> Result<Value, DbError> {
    let column = row.columns().get(index).ok_or(DbError::ColumnIndex {
        index,
        len: row.len(),
    })?;
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get::<bool>(row, index).map(|v| v.map(Value::Boolean)),
        Type::INT2 => get::<i16>(row, index).map(|v| v.map(Value::SmallInt)),
        Type::INT4 => get::<i32>(row, index).map(|v| v.map(Value::Int32)),
        Type::INT8 => get::<i64>(row, index).map(|v| v.map(Value::Int)),
        Type::OID => get::<u32>(row, index).map(|v| v.map(|v| Value::Uint(v as u64))),
        Type::FLOAT4 => get::<f32>(row, index).map(|v| v.map(|v| Value::Float(v as f64))),
        Type::FLOAT8 => get::<f64>(row, index).map(|v| v.map(Value::Float)),
        Type::NUMERIC => get::<RustDecimal>(row, index)?
            .map(|d| {
                BigDecimal::from_str(&d.to_string()).map_err(|e| DbError::Conversion {
                    column: column.name().to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
            .map(|v| v.map(Value::Decimal)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, index).map(|v| v.map(Value::String))
        }
        Type::BYTEA => get::<Vec<u8>>(row, index).map(|v| v.map(Value::Bytes)),
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, index).map(|v| v.map(Value::Json))
        }
        Type::UUID => get::<Uuid>(row, index).map(|v| v.map(Value::Uuid)),
        Type::DATE => get::<NaiveDate>(row, index).map(|v| v.map(Value::Date)),
        Type::TIME => get::<NaiveTime>(row, index).map(|v| v.map(Value::Time)),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index).map(|v| v.map(Value::TimestampNaive)),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, index).map(|v| v.map(Value::Timestamp)),
        _ => {
            // Text-like extension types (e.g. citext) decode as strings.
            row.try_get::<_, Option<String>>(index)
                .map(|v| v.map(Value::String))
                .map_err(|_| DbError::UnsupportedType {
                    column: column.name().to_string(),
                    type_name: ty.name().to_string(),
                })
        }
    }?;
    Ok(value.unwrap_or(Value::Null))
}

fn get<T: FromSqlOwned>(row: &PgRow, index: usize) -> Result<Option<T>, DbError> {
    Ok(row.try_get::<_, Option<T>>(index)?)
}
