use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash};
use uuid::Uuid;

/// Normalized in-memory column value read from a source or target table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    SmallInt(i16),
    Int32(i32),
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    TimestampNaive(NaiveDateTime),
    Timestamp(DateTime<Utc>),
}

/// Structural equality, consistent with `Hash`. Floats compare by bits, so
/// NaN equals itself and `0.0` differs from `-0.0` unless `normalized()`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (SmallInt(a), SmallInt(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Uint(a), Uint(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Decimal(a), Decimal(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Json(a), Json(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (TimestampNaive(a), TimestampNaive(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Null => {}
            Boolean(v) => v.hash(state),
            SmallInt(v) => v.hash(state),
            Int32(v) => v.hash(state),
            Int(v) => v.hash(state),
            Uint(v) => v.hash(state),
            // Bits keep NaN and -0.0 stable
            Float(v) => v.to_bits().hash(state),
            Decimal(v) => v.hash(state),
            String(v) => v.hash(state),
            Bytes(v) => v.hash(state),
            Json(v) => serde_json::to_string(v).unwrap_or_default().hash(state),
            Uuid(v) => v.hash(state),
            Date(v) => v.hash(state),
            Time(v) => v.hash(state),
            TimestampNaive(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            Value::String(v) => v.parse::<i64>().ok(),
            Value::Decimal(v) => v.to_string().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::SmallInt(v) => u64::try_from(*v).ok(),
            Value::Int32(v) => u64::try_from(*v).ok(),
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Uint(v) => Some(*v),
            Value::String(v) => v.parse::<u64>().ok(),
            Value::Decimal(v) => v.to_string().parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::SmallInt(v) => Some(*v as f64),
            Value::Int32(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) => v.to_string().parse::<f64>().ok(),
            Value::String(v) => v.parse::<f64>().ok(),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::SmallInt(_)
                | Value::Int32(_)
                | Value::Int(_)
                | Value::Uint(_)
                | Value::Float(_)
                | Value::Decimal(_)
        )
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::SmallInt(v) => Some(*v as i128),
            Value::Int32(v) => Some(*v as i128),
            Value::Int(v) => Some(*v as i128),
            Value::Uint(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds. Integers of different widths compare
    /// numerically; incompatible kinds yield `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        if let (Some(a), Some(b)) = (self.as_i128(), other.as_i128()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Float(_), _) | (_, Float(_)) if self.is_numeric() && other.is_numeric() => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Null, Null) => Some(Ordering::Equal),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            (TimestampNaive(a), TimestampNaive(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn equal(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Collapses representation differences between drivers so that equal
    /// column values also hash equally: every integer width becomes `Int`
    /// (`Uint` only above `i64::MAX`), decimals drop trailing zeros, `-0.0`
    /// becomes `0.0` and every NaN payload collapses to one NaN.
    pub fn normalized(self) -> Value {
        match self {
            Value::Float(v) if v.is_nan() => Value::Float(f64::NAN),
            Value::Float(v) if v == 0.0 => Value::Float(0.0),
            Value::SmallInt(v) => Value::Int(v as i64),
            Value::Int32(v) => Value::Int(v as i64),
            Value::Uint(v) => i64::try_from(v).map(Value::Int).unwrap_or(Value::Uint(v)),
            Value::Decimal(v) => Value::Decimal(v.normalized()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Bytes(v) => {
                let hex = v.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
                write!(f, "x'{hex}'")
            }
            Value::Json(v) => write!(f, "'{}'", v.to_string().replace('\'', "''")),
            Value::Uuid(v) => write!(f, "'{v}'"),
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Time(v) => write!(f, "'{v}'"),
            Value::TimestampNaive(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
