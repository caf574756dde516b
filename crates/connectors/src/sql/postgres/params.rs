use bigdecimal::ToPrimitive;
use model::core::value::Value;
use rust_decimal::{Decimal as RustDecimal, prelude::FromPrimitive as DecimalFromPrimitive};
use std::str::FromStr;
use tokio_postgres::types::{Json as PgJson, ToSql, Type};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::SmallInt(v) => PgParam(Box::new(v)),
            Value::Int32(v) => PgParam(Box::new(v)),
            Value::Int(v) => PgParam(Box::new(v)),
            Value::Uint(v) => PgParam(Box::new(v as i64)),
            Value::Float(v) => PgParam(Box::new(v)),
            Value::Decimal(v) => PgParam(Box::new(to_rust_decimal(&v))),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Json(v) => PgParam(Box::new(PgJson(v))),
            Value::Uuid(v) => PgParam(Box::new(v)),
            Value::Bytes(v) => PgParam(Box::new(v)),
            Value::Date(v) => PgParam(Box::new(v)),
            Value::Time(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::TimestampNaive(v) => PgParam(Box::new(v)),
            Value::Null => PgParam(Box::new(Option::<String>::None)),
        }
    }

    /// Converts `value` to the Rust type the server declared for the placeholder,
    /// so that e.g. an `i64` checkpoint binds against an `int4` key column.
    pub fn for_type(value: Value, ty: &Type) -> Self {
        if value.is_null() {
            return PgParam::null_for(ty);
        }
        let coerced = match *ty {
            Type::INT2 => value
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(|v| PgParam(Box::new(v))),
            Type::INT4 => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(|v| PgParam(Box::new(v))),
            Type::INT8 => value.as_i64().map(|v| PgParam(Box::new(v))),
            Type::OID => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(|v| PgParam(Box::new(v))),
            Type::FLOAT4 => value.as_f64().map(|v| PgParam(Box::new(v as f32))),
            Type::FLOAT8 => value.as_f64().map(|v| PgParam(Box::new(v))),
            Type::NUMERIC => match &value {
                Value::Decimal(d) => Some(PgParam(Box::new(to_rust_decimal(d)))),
                other => other
                    .as_i64()
                    .map(|v| PgParam(Box::new(RustDecimal::from(v)))),
            },
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => match &value {
                Value::String(_) => None,
                Value::Uuid(u) => Some(PgParam(Box::new(u.to_string()))),
                other => other.as_i64().map(|v| PgParam(Box::new(v.to_string()))),
            },
            _ => None,
        };
        coerced.unwrap_or_else(|| PgParam::from_value(value))
    }

    fn null_for(ty: &Type) -> Self {
        match *ty {
            Type::INT2 => PgParam(Box::new(Option::<i16>::None)),
            Type::INT4 => PgParam(Box::new(Option::<i32>::None)),
            Type::INT8 => PgParam(Box::new(Option::<i64>::None)),
            Type::FLOAT8 => PgParam(Box::new(Option::<f64>::None)),
            Type::NUMERIC => PgParam(Box::new(Option::<RustDecimal>::None)),
            _ => PgParam(Box::new(Option::<String>::None)),
        }
    }
}

fn to_rust_decimal(value: &bigdecimal::BigDecimal) -> RustDecimal {
    RustDecimal::from_str(&value.to_string()).unwrap_or_else(|_| {
        DecimalFromPrimitive::from_f64(value.to_f64().unwrap_or(0.0)).unwrap_or_default()
    })
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            params: values.into_iter().map(PgParam::from_value).collect(),
        }
    }

    /// Binds `values` against the parameter types of a prepared statement.
    /// Values beyond the declared parameters fall back to their natural type.
    pub fn for_statement(values: Vec<Value>, types: &[Type]) -> Self {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match types.get(i) {
                Some(ty) => PgParam::for_type(value, ty),
                None => PgParam::from_value(value),
            })
            .collect();
        Self { params }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_params_follow_declared_types() {
        let store = PgParamStore::for_statement(
            vec![Value::Int(10), Value::Int32(20), Value::Null],
            &[Type::INT4, Type::INT8, Type::INT4],
        );
        let refs = store.as_refs();

        let mut buf = BytesMut::new();
        assert!(refs[0].to_sql_checked(&Type::INT4, &mut buf).is_ok());
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        assert!(refs[1].to_sql_checked(&Type::INT8, &mut buf).is_ok());
        assert_eq!(buf.len(), 8);

        let mut buf = BytesMut::new();
        assert!(refs[2].to_sql_checked(&Type::INT4, &mut buf).is_ok());
    }

    #[test]
    fn test_natural_binding_rejects_narrower_column() {
        let store = PgParamStore::from_values(vec![Value::Int(10)]);
        let mut buf = BytesMut::new();
        assert!(store.as_refs()[0].to_sql_checked(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn test_numeric_from_integer() {
        let param = PgParam::for_type(Value::Int(42), &Type::NUMERIC);
        let mut buf = BytesMut::new();
        assert!(param.as_ref().to_sql_checked(&Type::NUMERIC, &mut buf).is_ok());
    }
}
