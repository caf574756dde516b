use crate::{
    conn::{ConnectionPinger, DataSourcePinger},
    error::CliError,
    output::CheckReport,
    shutdown::ShutdownCoordinator,
};
use clap::Parser;
use commands::Commands;
use connectors::sql::base::adapter::DatabaseType;
use engine_core::consistency::factory::supported_algorithms;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod check;
mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Matched = 0,
    Failed = 1,
    Mismatched = 2,
    Interrupted = 130,
}

#[derive(Parser)]
#[command(
    name = "shardflow",
    version = "0.0.1",
    about = "Data consistency checks between source and target databases"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so reports on stdout stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(code) => code,
        Err(CliError::ShutdownRequested) => {
            info!("Stopped on shutdown request");
            ExitCode::Interrupted
        }
        Err(e) => {
            error!("{e}");
            ExitCode::Failed
        }
    };
    std::process::exit(code as i32);
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<ExitCode, CliError> {
    match command {
        Commands::Check(args) => {
            let output = args.output.clone();
            let report = check::run_check(args, shutdown).await?;
            emit(&report, output).await?;
            Ok(if report.matched {
                ExitCode::Matched
            } else {
                ExitCode::Mismatched
            })
        }
        Commands::Algorithms => {
            output::print_report(&supported_algorithms())?;
            Ok(ExitCode::Matched)
        }
        Commands::TestConn { format, conn_str } => {
            let database_type = match format.parse::<DatabaseType>() {
                Ok(DatabaseType::Other(name)) => return Err(CliError::InvalidConnectionFormat(name)),
                Ok(database_type) => database_type,
                Err(never) => match never {},
            };
            DataSourcePinger {
                database_type,
                conn_str,
            }
            .ping()
            .await?;
            Ok(ExitCode::Matched)
        }
    }
}

async fn emit(report: &CheckReport, output: Option<String>) -> Result<(), CliError> {
    match output {
        Some(path) => output::write_report(report, path).await,
        None => output::print_report(report),
    }
}
