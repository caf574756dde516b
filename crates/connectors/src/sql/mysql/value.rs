use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::core::value::Value;
use mysql_async::{
    Column, Row as MySqlRow, Value as MySqlValue,
    consts::{ColumnFlags, ColumnType},
};
use std::str::FromStr;

/// `character_set` id MySQL reports for binary strings and blobs.
const BINARY_CHARSET: u16 = 63;

pub(crate) fn read_value(row: &MySqlRow, index: usize) -> Result<Value, DbError> {
    let column = row.columns_ref().get(index).ok_or(DbError::ColumnIndex {
        index,
        len: row.len(),
    })?;
    let raw = row.as_ref(index).ok_or_else(|| DbError::Conversion {
        column: column.name_str().into_owned(),
        message: "value already taken from row".to_string(),
    })?;
    convert(column, raw)
}

fn convert(column: &Column, raw: &MySqlValue) -> Result<Value, DbError> {
    match raw {
        MySqlValue::NULL => Ok(Value::Null),
        MySqlValue::Int(v) => Ok(Value::Int(*v)),
        MySqlValue::UInt(v) => Ok(Value::Uint(*v)),
        MySqlValue::Float(v) => Ok(Value::Float(*v as f64)),
        MySqlValue::Double(v) => Ok(Value::Float(*v)),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => Ok(date_value(
            column.column_type(),
            (*year, *month, *day),
            (*hour, *minute, *second, *micros),
        )),
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            if !negative && *days == 0 {
                if let Some(time) = NaiveTime::from_hms_micro_opt(
                    *hours as u32,
                    *minutes as u32,
                    *seconds as u32,
                    *micros,
                ) {
                    return Ok(Value::Time(time));
                }
            }
            // Durations outside a single day keep MySQL's textual form.
            let sign = if *negative { "-" } else { "" };
            let total_hours = *days * 24 + *hours as u32;
            Ok(Value::String(format!(
                "{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            )))
        }
        MySqlValue::Bytes(bytes) => bytes_value(column, bytes),
    }
}

fn date_value(column_type: ColumnType, ymd: (u16, u8, u8), hms: (u8, u8, u8, u32)) -> Value {
    let (year, month, day) = ymd;
    let (hour, minute, second, micros) = hms;
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
    let is_date_only = matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    );

    match date {
        Some(date) if is_date_only => Value::Date(date),
        Some(date) => date
            .and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros)
            .map(Value::TimestampNaive)
            .unwrap_or(Value::Null),
        // Zero dates have no calendar representation
        None => Value::String(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        )),
    }
}

fn bytes_value(column: &Column, bytes: &[u8]) -> Result<Value, DbError> {
    let column_name = || column.name_str().into_owned();
    let text = || {
        std::str::from_utf8(bytes).map_err(|e| DbError::Conversion {
            column: column_name(),
            message: e.to_string(),
        })
    };
    let unsigned = column.flags().contains(ColumnFlags::UNSIGNED_FLAG);

    match column.column_type() {
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            BigDecimal::from_str(text()?)
                .map(Value::Decimal)
                .map_err(|e| DbError::Conversion {
                    column: column_name(),
                    message: e.to_string(),
                })
        }
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            let raw = text()?;
            let parsed = if unsigned {
                raw.parse::<u64>().map(Value::Uint).ok()
            } else {
                raw.parse::<i64>().map(Value::Int).ok()
            };
            parsed.ok_or_else(|| DbError::Conversion {
                column: column_name(),
                message: format!("invalid integer literal '{raw}'"),
            })
        }
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => text()?
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| DbError::Conversion {
                column: column_name(),
                message: e.to_string(),
            }),
        ColumnType::MYSQL_TYPE_JSON => serde_json::from_slice(bytes)
            .map(Value::Json)
            .map_err(|e| DbError::Conversion {
                column: column_name(),
                message: e.to_string(),
            }),
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
            let raw = text()?;
            Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or_else(|_| Value::String(raw.to_string())))
        }
        ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2 => {
            let raw = text()?;
            Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(Value::TimestampNaive)
                .unwrap_or_else(|_| Value::String(raw.to_string())))
        }
        ColumnType::MYSQL_TYPE_BIT | ColumnType::MYSQL_TYPE_GEOMETRY => {
            Ok(Value::Bytes(bytes.to_vec()))
        }
        _ if column.character_set() == BINARY_CHARSET => Ok(Value::Bytes(bytes.to_vec())),
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::String(s.to_string())),
            Err(_) => Ok(Value::Bytes(bytes.to_vec())),
        },
    }
}
