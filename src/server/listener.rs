use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ConnectionError;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::routing::Router;
use crate::store::BlobStore;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does
/// not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    let router = Arc::new(Router::from_config(cfg));
    serve(listener, router, ConnectionSettings::from(cfg)).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve<S: BlobStore>(
    listener: TcpListener,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, router, settings);
            match conn.run().await {
                Ok(()) => {}
                Err(ConnectionError::Malformed(e)) => {
                    debug!("Answered malformed request from {}: {}", peer, e);
                }
                Err(e) => error!("Connection error from {}: {}", peer, e),
            }
        });
    }
}
