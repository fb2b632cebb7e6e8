//! `survey serve` subcommand.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use survey_collector::CollectorServer;
use survey_collector::CollectorService;
use survey_collector::SheetStore;

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Address to listen on. Port 0 picks a free port.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:7878")]
    pub addr: SocketAddr,

    /// CSV sheet file backing the row store.
    #[arg(long, value_name = "FILE", default_value = "survey-sheet.csv")]
    pub sheet: PathBuf,
}

/// Run the collection endpoint until ctrl-c.
pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let store = SheetStore::open(&args.sheet)
        .with_context(|| format!("cannot open sheet at {}", args.sheet.display()))?;
    let server = CollectorServer::spawn(args.addr, CollectorService::new(store))
        .context("failed to start the collector")?;
    println!(
        "collecting on http://{}/ into {}",
        server.local_addr(),
        args.sheet.display()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutting down");
    server.shutdown();
    Ok(())
}
