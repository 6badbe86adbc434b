//! Log Ingestion Server
//!
//! Accepts log entries over HTTP and publishes them to the message broker.
//! Exits non-zero if the broker topology cannot be declared at startup.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;

    server::start_server(config).await?;

    Ok(())
}
