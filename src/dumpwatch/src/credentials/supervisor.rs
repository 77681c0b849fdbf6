use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runs the task produced by `make` and restarts it after `backoff` if it
/// panics. A task that returns normally is considered finished.
pub fn supervise<F, Fut>(name: String, backoff: Duration, make: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match tokio::spawn(make()).await {
                Ok(()) => {
                    info!("Background task {} finished", name);
                    return;
                }
                Err(e) if e.is_panic() => {
                    error!("Background task {} panicked, restarting in {:?}", name, backoff);
                    tokio::time::sleep(backoff).await;
                }
                Err(_) => return,
            }
        }
    })
}
