use crate::error::CliError;
use engine_core::consistency::checker::DataConsistencyCheckResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON report of one `check` run.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub algorithm: String,
    pub matched: bool,
    pub tables: BTreeMap<String, DataConsistencyCheckResult>,
}

impl CheckReport {
    pub fn new(algorithm: &str, tables: BTreeMap<String, DataConsistencyCheckResult>) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            matched: tables.values().all(DataConsistencyCheckResult::is_matched),
            tables,
        }
    }
}

fn generate_report_json<T: Serialize>(report: &T) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

pub async fn write_report<T: Serialize>(report: &T, path: String) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report<T: Serialize>(report: &T) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    println!("{report_json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::consistency::checker::{ContentCheckResult, CountCheckResult};

    fn result(matched: bool) -> DataConsistencyCheckResult {
        DataConsistencyCheckResult {
            count: CountCheckResult {
                source: 3,
                target: 3,
                matched: true,
            },
            content: ContentCheckResult { matched },
        }
    }

    #[test]
    fn test_report_matches_only_if_every_table_does() {
        let mut tables = BTreeMap::new();
        tables.insert("t_order".to_string(), result(true));
        assert!(CheckReport::new("DATA_MATCH", tables.clone()).matched);

        tables.insert("t_order_item".to_string(), result(false));
        let report = CheckReport::new("DATA_MATCH", tables);
        assert!(!report.matched);

        let json = generate_report_json(&report).unwrap();
        assert!(json.contains("\"t_order_item\""));
        assert!(json.contains("\"algorithm\": \"DATA_MATCH\""));
    }
}
