use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pocket_ledger::application::engine::LedgerEngine;
use pocket_ledger::application::journal::Journal;
use pocket_ledger::config::{DEFAULT_INITIAL_AMOUNT, DEFAULT_PORT, ServerConfig, StorageConfig};
use pocket_ledger::interfaces::server::Server;
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Opening balance of the main account (ignored when saved state is restored)
    #[arg(long, default_value_t = DEFAULT_INITIAL_AMOUNT, allow_negative_numbers = true)]
    initial_amount: Decimal,

    /// Persist ledger snapshots to this JSON file and restore from it at startup
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, conflicts_with = "state_file")]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "pocket_ledger=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = StorageConfig::from_paths(cli.state_file, cli.db_path).into_diagnostic()?;
    let config = ServerConfig::new(cli.host, cli.port, cli.initial_amount, storage)
        .into_diagnostic()?;

    let store = config.storage.open().into_diagnostic()?;
    let (journal, journal_task) = Journal::spawn(Arc::clone(&store));
    let engine = Arc::new(
        LedgerEngine::load_or_new(&store, config.initial_amount)
            .await
            .into_diagnostic()?
            .with_journal(journal),
    );

    let server = Server::bind(config.listen_addr, Arc::clone(&engine))
        .await
        .into_diagnostic()?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
        .into_diagnostic()?;

    // Connections still open keep the journal alive, so close it before the final write.
    engine
        .persist_final(journal_task, &store)
        .await
        .into_diagnostic()?;
    tracing::info!("ledger state saved; shutting down");

    Ok(())
}
