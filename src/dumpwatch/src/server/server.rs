use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::app::get_app;
use crate::pipeline::TriggerHandler;

pub struct DumpwatchServer {
    handler: Arc<TriggerHandler>,
    listener: TcpListener,
}

impl DumpwatchServer {
    pub async fn bind(address: &str, handler: Arc<TriggerHandler>) -> anyhow::Result<Self> {
        let addr: SocketAddr = address.parse()?;

        match TcpListener::bind(addr).await {
            Ok(listener) => Ok(Self { handler, listener }),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                anyhow::bail!("Failed to start dumpwatch: port {} is already in use", addr.port())
            }
            Err(e) => anyhow::bail!("Failed to bind to address {}: {}", addr, e),
        }
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the token is cancelled or the process receives ctrl-c.
    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        let app = get_app(self.handler, cancellation_token.clone());
        info!("Listening on {}", self.listener.local_addr()?);

        let shutdown = cancellation_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received ctrl-c, shutting down");
                shutdown.cancel();
            }
        });

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
            .await?;
        Ok(())
    }
}
