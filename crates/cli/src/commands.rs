use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Verify that source and target tables hold the same data
    Check(CheckArgs),
    /// List the available consistency check algorithms
    Algorithms,
    /// Test a connection string against a given database type
    TestConn {
        /// Database type: "mysql", "pg", "opengauss", …
        #[arg(long)]
        format: String,

        /// Connection string
        #[arg(long)]
        conn_str: String,
    },
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long, help = "Source connection URL")]
    pub source_url: String,

    #[arg(long, help = "Target connection URL")]
    pub target_url: String,

    #[arg(long, help = "Source database type, inferred from the URL when omitted")]
    pub source_type: Option<String>,

    #[arg(long, help = "Target database type, inferred from the URL when omitted")]
    pub target_type: Option<String>,

    #[arg(
        long = "table",
        required = true,
        help = "Table to check, `name` or `source_name=target_name`; repeatable"
    )]
    pub tables: Vec<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Columns to compare, all columns when omitted"
    )]
    pub columns: Vec<String>,

    #[arg(long, help = "Unique key column, required by DATA_MATCH")]
    pub unique_key: Option<String>,

    #[arg(long, default_value = "DATA_MATCH", help = "Algorithm type")]
    pub algorithm: String,

    #[arg(
        long = "prop",
        help = "Algorithm property as key=value, e.g. chunk-size=500; repeatable"
    )]
    pub props: Vec<String>,

    #[arg(
        long,
        help = "If specified, writes the JSON report to this file instead of stdout"
    )]
    pub output: Option<String>,
}

/// One `--table` argument split into source and target names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePair {
    pub source: String,
    pub target: String,
}

impl TablePair {
    pub fn parse(raw: &str) -> Option<Self> {
        let (source, target) = match raw.split_once('=') {
            Some((source, target)) => (source.trim(), target.trim()),
            None => (raw.trim(), raw.trim()),
        };
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(TablePair {
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}
