use async_trait::async_trait;
use connectors::sql::base::{
    adapter::DatabaseType,
    error::DbError,
    row::DbRow,
    source::{PipelineConnection, PipelineDataSource, RowCursor},
};
use model::core::value::Value;
use std::{
    cmp::Ordering,
    collections::{VecDeque, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};
use tracing::debug;

/// Where a `MemoryDataSource` should fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Connect,
    OpenCursor,
    /// `next_row` fails once this many rows were handed out by one cursor.
    AfterRows(usize),
    Query,
    Close,
}

/// Calls observed by a `MemoryDataSource`, shared by all its connections.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub connects: AtomicUsize,
    pub open_cursors: AtomicUsize,
    pub rows_fetched: AtomicUsize,
    pub queries: AtomicUsize,
    pub cursor_closes: AtomicUsize,
    pub connection_closes: AtomicUsize,
}

impl CallCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(AtomicOrdering::SeqCst)
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

/// A single table held in memory.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub columns: Vec<String>,
    pub unique_key: String,
    pub rows: Vec<Vec<Value>>,
}

impl MemoryTable {
    pub fn new<I, S>(columns: I, unique_key: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique_key: unique_key.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        self.rows.extend(rows);
        self
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Rows ordered by the unique key, restricted to `(lower, upper]`.
    fn scan(&self, lower: Option<&Value>, upper: Option<&Value>) -> Vec<Vec<Value>> {
        let Some(key) = self.column_index(&self.unique_key) else {
            return self.rows.clone();
        };
        let mut rows = self
            .rows
            .iter()
            .filter(|row| lower.is_none_or(|l| row[key].compare(l) == Some(Ordering::Greater)))
            .filter(|row| upper.is_none_or(|u| row[key].compare(u) != Some(Ordering::Greater)))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a[key].compare(&b[key]).unwrap_or(Ordering::Equal));
        rows
    }

    /// XOR of per-row hashes, standing in for `BIT_XOR(CRC32(col))`.
    fn checksum(&self, column: &str) -> Option<u64> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().fold(0u64, |acc, row| {
            let mut hasher = DefaultHasher::new();
            row[index].clone().normalized().hash(&mut hasher);
            acc ^ (hasher.finish() & 0xFFFF_FFFF)
        }))
    }
}

struct Shared {
    table: MemoryTable,
    failure: Option<ScriptedFailure>,
    counters: Arc<CallCounters>,
    statements: Mutex<Vec<(String, Vec<Value>)>>,
}

/// `PipelineDataSource` over a `MemoryTable`, answering the SQL the
/// consistency algorithms generate and counting every call.
#[derive(Clone)]
pub struct MemoryDataSource {
    database_type: DatabaseType,
    shared: Arc<Shared>,
}

impl MemoryDataSource {
    pub fn new(database_type: DatabaseType, table: MemoryTable) -> Self {
        Self::build(database_type, table, None)
    }

    pub fn failing(database_type: DatabaseType, table: MemoryTable, failure: ScriptedFailure) -> Self {
        Self::build(database_type, table, Some(failure))
    }

    fn build(
        database_type: DatabaseType,
        table: MemoryTable,
        failure: Option<ScriptedFailure>,
    ) -> Self {
        Self {
            database_type,
            shared: Arc::new(Shared {
                table,
                failure,
                counters: Arc::new(CallCounters::default()),
                statements: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn counters(&self) -> Arc<CallCounters> {
        Arc::clone(&self.shared.counters)
    }

    /// Every statement executed so far with its bound parameters.
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.shared
            .statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PipelineDataSource for MemoryDataSource {
    fn database_type(&self) -> DatabaseType {
        self.database_type.clone()
    }

    async fn connect(&self) -> Result<Box<dyn PipelineConnection>, DbError> {
        CallCounters::bump(&self.shared.counters.connects);
        if self.shared.failure == Some(ScriptedFailure::Connect) {
            return Err(DbError::Unknown("scripted connect failure".into()));
        }
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    closed: bool,
}

impl MemoryConnection {
    fn record(&self, sql: &str, params: &[Value]) {
        debug!(%sql, "Memory statement");
        if let Ok(mut statements) = self.shared.statements.lock() {
            statements.push((sql.to_string(), params.to_vec()));
        }
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::Closed("memory connection is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineConnection for MemoryConnection {
    async fn query_first(&mut self, sql: &str, params: &[Value]) -> Result<Option<DbRow>, DbError> {
        self.ensure_open()?;
        self.record(sql, params);
        CallCounters::bump(&self.shared.counters.queries);
        if self.shared.failure == Some(ScriptedFailure::Query) {
            return Err(DbError::Unknown("scripted query failure".into()));
        }

        let table = &self.shared.table;
        let column = crc32_column(sql)
            .ok_or_else(|| DbError::Unknown(format!("memory source cannot run '{sql}'")))?;
        let checksum = table.checksum(&column).ok_or_else(|| DbError::Conversion {
            column: column.clone(),
            message: "no such column".into(),
        })?;
        let checksum = if table.rows.is_empty() {
            Value::Null
        } else {
            Value::Uint(checksum)
        };
        Ok(Some(DbRow::from_values(
            vec!["checksum".into(), "cnt".into()],
            vec![checksum, Value::Int(table.rows.len() as i64)],
        )))
    }

    async fn open_cursor(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Box<dyn RowCursor>, DbError> {
        self.ensure_open()?;
        self.record(sql, params);
        CallCounters::bump(&self.shared.counters.open_cursors);
        if self.shared.failure == Some(ScriptedFailure::OpenCursor) {
            return Err(DbError::Unknown("scripted cursor failure".into()));
        }

        let table = &self.shared.table;
        let mut bound = params.iter();
        let lower = if sql.contains(" > ") { bound.next() } else { None };
        let upper = if sql.contains(" <= ") { bound.next() } else { None };

        let projection = projection(sql, &table.columns);
        let indexes = projection
            .iter()
            .map(|name| {
                table.column_index(name).ok_or_else(|| DbError::Conversion {
                    column: name.clone(),
                    message: "no such column".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = table
            .scan(lower, upper)
            .into_iter()
            .map(|row| indexes.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Box::new(MemoryCursor {
            shared: Arc::clone(&self.shared),
            columns: projection,
            rows,
            fetched: 0,
            closed: false,
        }))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        CallCounters::bump(&self.shared.counters.connection_closes);
        self.closed = true;
        if self.shared.failure == Some(ScriptedFailure::Close) {
            return Err(DbError::Unknown("scripted close failure".into()));
        }
        Ok(())
    }
}

struct MemoryCursor {
    shared: Arc<Shared>,
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    fetched: usize,
    closed: bool,
}

#[async_trait]
impl RowCursor for MemoryCursor {
    async fn next_row(&mut self) -> Result<Option<DbRow>, DbError> {
        if self.closed {
            return Err(DbError::Closed("memory cursor is closed".into()));
        }
        if self.shared.failure == Some(ScriptedFailure::AfterRows(self.fetched)) {
            return Err(DbError::Unknown("scripted read failure".into()));
        }
        let Some(values) = self.rows.pop_front() else {
            return Ok(None);
        };
        self.fetched += 1;
        CallCounters::bump(&self.shared.counters.rows_fetched);
        Ok(Some(DbRow::from_values(self.columns.clone(), values)))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        CallCounters::bump(&self.shared.counters.cursor_closes);
        self.closed = true;
        Ok(())
    }
}

fn unquote(ident: &str) -> String {
    ident.trim().trim_matches(['`', '"']).to_string()
}

/// Column named in `CRC32(col)`.
fn crc32_column(sql: &str) -> Option<String> {
    let start = sql.find("CRC32(")? + "CRC32(".len();
    let end = start + sql[start..].find(')')?;
    Some(unquote(&sql[start..end]))
}

/// Columns between `SELECT` and `FROM`; `*` expands to the whole table.
fn projection(sql: &str, all: &[String]) -> Vec<String> {
    let list = sql
        .strip_prefix("SELECT ")
        .and_then(|rest| rest.split_once(" FROM "))
        .map(|(list, _)| list.trim())
        .unwrap_or("*");
    if list == "*" {
        return all.to_vec();
    }
    list.split(',').map(unquote).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_helpers() {
        assert_eq!(
            crc32_column("SELECT BIT_XOR(CAST(CRC32(`status`) AS UNSIGNED)) AS checksum"),
            Some("status".to_string())
        );
        let all = vec!["id".to_string(), "name".to_string()];
        assert_eq!(projection("SELECT * FROM `t` ORDER BY `id` ASC", &all), all);
        assert_eq!(
            projection("SELECT \"name\" FROM \"t\"", &all),
            vec!["name".to_string()]
        );
    }

    #[test]
    fn test_scan_is_ordered_and_bounded() {
        let table = MemoryTable::new(["id"], "id").with_rows(
            [3, 1, 4, 2, 5].into_iter().map(|id| vec![Value::Int(id)]),
        );
        let ids = table
            .scan(Some(&Value::Int(1)), Some(&Value::Int(4)))
            .into_iter()
            .map(|row| row[0].clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
    }
}
