//! The Gridlock server binary.
//!
//! Binds to `0.0.0.0:$PORT` (default 3000). Log verbosity follows
//! `RUST_LOG`, defaulting to `info`.

use gridlock::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{port}");

    let server = ServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "gridlock listening");
    server.run().await?;
    Ok(())
}
