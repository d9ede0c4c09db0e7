//! # gamehall
//!
//! ```bash
//! # Listen on the default address
//! gamehall
//!
//! # Pick the address and log level
//! GAMEHALL_ADDR=127.0.0.1:9000 RUST_LOG=gamehall=debug gamehall
//! ```

use gamehall::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "0.0.0.0:3001";

#[tokio::main]
async fn main() -> Result<(), GamehallError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gamehall=info,gamehall_room=info,gamehall_transport=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("GAMEHALL_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let server = GamehallServer::builder().bind(&addr).build().await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}
