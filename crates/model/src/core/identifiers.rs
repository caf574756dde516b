use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Identifies one upstream shard/source importer feeding the change-stream merger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceChannel(Arc<str>);

impl SourceChannel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SourceChannel {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SourceChannel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for SourceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Schema-qualified table reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub schema: Option<String>,
    pub table: String,
}

impl TableName {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            table: table.into(),
        }
    }
}

impl From<&str> for TableName {
    /// Splits `schema.table`; a bare name has no schema.
    fn from(s: &str) -> Self {
        match s.split_once('.') {
            Some((schema, table)) if !schema.is_empty() => Self::with_schema(schema, table),
            _ => Self::new(s),
        }
    }
}

impl From<String> for TableName {
    fn from(s: String) -> Self {
        TableName::from(s.as_str())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}
