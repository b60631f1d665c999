use clap::{Parser, Subcommand};
use dotenv::dotenv;
use pes_gateway::{Dependencies, GatewayError, SyncConfig};
use pes_gateway_repository::PostgresStore;
use pes_gateway_shared::types::EntityKind;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "pes_gateway=info,pes_gateway_pipeline=info";

#[derive(Parser)]
#[command(name = "pes-gateway")]
#[command(about = "Keeps a local store in sync with a PES instance", long_about = None)]
struct Cli {
    /// Log output format: `json` or `pretty`
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror the PES into the local store
    Import {
        /// Only import these kinds (repeatable); every kind when omitted
        #[arg(short, long = "kind", value_parser = parse_kind)]
        kinds: Vec<EntityKind>,
    },
    /// Push every natively-owned record to the PES
    Export,
    /// Create or upgrade the local schema
    Migrate,
}

fn parse_kind(value: &str) -> Result<EntityKind, String> {
    EntityKind::parse(value).ok_or_else(|| format!("unknown entity kind `{value}`"))
}

/// Initialize tracing with JSON output for production or pretty console
/// output otherwise.
fn init_tracing(log_format: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    info!(
        service_name = "pes-gateway",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

/// Main entry point for the PES gateway.
///
/// Loads dotenv, initializes tracing and runs the requested command.
#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_format);

    let result = run(cli.command).await;
    if let Err(err) = &result {
        error!(error = %err, "Command failed");
    }
    result
}

async fn run(command: Command) -> Result<(), GatewayError> {
    match command {
        Command::Migrate => {
            let store = PostgresStore::connect(&pes_gateway::config::database_url()?).await?;
            store.migrate().await?;
            Ok(())
        }
        Command::Import { kinds } => {
            let config = SyncConfig::from_env()?;
            let dependencies = Dependencies::new(&config).await?;
            let report = if kinds.is_empty() {
                dependencies.importer.run().await?
            } else {
                dependencies.importer.run_kinds(&kinds).await?
            };

            for (subject, err) in report.aborted() {
                warn!(subject = %subject, error = %err, "Collection was not imported");
            }
            for record in report.errors() {
                if let Err(err) = &record.result {
                    warn!(
                        subject = %record.subject,
                        key = %record.key,
                        error = %err,
                        "Record was not imported"
                    );
                }
            }
            info!(
                records = report.records().len(),
                changes = report.changes(),
                clean = report.is_clean(),
                "Import finished"
            );
            Ok(())
        }
        Command::Export => {
            let config = SyncConfig::from_env()?;
            let dependencies = Dependencies::new(&config).await?;
            let report = dependencies.exporter.export_all().await?;
            if report.is_clean() {
                Ok(())
            } else {
                Err(GatewayError::ExportIncomplete {
                    failed: report.failed.len(),
                })
            }
        }
    }
}
