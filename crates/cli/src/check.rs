use crate::{
    commands::{CheckArgs, TablePair},
    error::CliError,
    output::CheckReport,
    shutdown::ShutdownCoordinator,
};
use connectors::{
    adapter::{data_source, database_type_from_url},
    sql::base::{adapter::DatabaseType, source::PipelineDataSource},
};
use engine_core::consistency::{
    checker::{DataConsistencyChecker, TableCheckTask},
    factory::create_algorithm,
    parameter::DataConsistencyCalculateParameter,
};
use model::execution::properties::AlgorithmProperties;
use std::sync::Arc;
use tracing::info;

/// Runs the consistency check described by `args`. A shutdown signal cancels
/// the algorithm, which fails the running calculations.
pub async fn run_check(
    args: CheckArgs,
    shutdown: &ShutdownCoordinator,
) -> Result<CheckReport, CliError> {
    let props = parse_props(&args.props)?;
    let checker = DataConsistencyChecker::new(create_algorithm(&args.algorithm, &props)?);

    let source = open_source(&args.source_url, args.source_type.as_deref())?;
    let target = open_source(&args.target_url, args.target_type.as_deref())?;

    let tasks = args
        .tables
        .iter()
        .map(|raw| {
            let pair = TablePair::parse(raw).ok_or_else(|| CliError::InvalidTable(raw.clone()))?;
            Ok(TableCheckTask {
                source: parameter(&pair.source, &source, &args),
                target: parameter(&pair.target, &target, &args),
            })
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    info!(
        algorithm = checker.algorithm().algorithm_type(),
        tables = tasks.len(),
        "Starting consistency check"
    );

    let canceler = checker.clone();
    let watcher = shutdown.forward(move || canceler.cancel());

    let outcome = checker.check_tables(tasks).await;
    watcher.abort();

    let results = match outcome {
        Err(e) if shutdown.is_shutdown_requested() || e.is_canceled() => {
            return Err(CliError::ShutdownRequested);
        }
        other => other?,
    };
    Ok(CheckReport::new(checker.algorithm().algorithm_type(), results))
}

fn parse_props(raw: &[String]) -> Result<AlgorithmProperties, CliError> {
    let mut props = AlgorithmProperties::new();
    for entry in raw {
        let parsed: AlgorithmProperties = entry.parse()?;
        for (key, value) in parsed.iter() {
            props.insert(key, value);
        }
    }
    Ok(props)
}

fn open_source(
    url: &str,
    database_type: Option<&str>,
) -> Result<Arc<dyn PipelineDataSource>, CliError> {
    let database_type = match database_type {
        Some(name) => match name.parse::<DatabaseType>() {
            Ok(DatabaseType::Other(name)) => return Err(CliError::InvalidConnectionFormat(name)),
            Ok(database_type) => database_type,
            Err(never) => match never {},
        },
        None => database_type_from_url(url)?,
    };
    Ok(data_source(&database_type, url)?)
}

fn parameter(
    table: &str,
    source: &Arc<dyn PipelineDataSource>,
    args: &CheckArgs,
) -> DataConsistencyCalculateParameter {
    let param = DataConsistencyCalculateParameter::new(table, Arc::clone(source))
        .with_columns(args.columns.iter().cloned());
    match &args.unique_key {
        Some(key) => param.with_unique_key(key.clone()),
        None => param,
    }
}
