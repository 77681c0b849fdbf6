use http::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::CredentialStore;
use crate::types::Credential;

/// Read side of the header cell consulted on every control-plane request.
#[derive(Clone)]
pub struct AuthorizationHeader {
    rx: watch::Receiver<HeaderValue>,
}

impl AuthorizationHeader {
    pub fn current(&self) -> HeaderValue {
        self.rx.borrow().clone()
    }
}

fn header_for(credential: &Credential) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&credential.bearer()).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// Starts the loop that copies the store's credential into the request
/// header whenever it changes. It runs independently of token renewal so a
/// slow consumer cannot hold up the refresher.
pub fn spawn_header_propagation(
    store: &CredentialStore,
    interval: Duration,
    label: String,
) -> (AuthorizationHeader, JoinHandle<()>) {
    let initial = header_for(&store.read()).unwrap_or_else(|| HeaderValue::from_static(""));
    let (tx, rx) = watch::channel(initial);
    let mut updates = store.subscribe();
    updates.mark_unchanged();

    let handle = tokio::spawn(async move {
        propagate(&mut updates, &tx, interval, &label).await;
    });

    (AuthorizationHeader { rx }, handle)
}

async fn propagate(
    updates: &mut watch::Receiver<Arc<Credential>>,
    tx: &watch::Sender<HeaderValue>,
    interval: Duration,
    label: &str,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        debug!("Authorization header refresh loop for {}", label);
        match updates.has_changed() {
            Ok(true) => {
                let credential = updates.borrow_and_update().clone();
                match header_for(&credential) {
                    Some(value) => {
                        tx.send_replace(value);
                        info!("Propagated refreshed credential for {}", label);
                    }
                    None => warn!("Refreshed token for {} is not a valid header value", label),
                }
            }
            Ok(false) => {}
            Err(_) => {
                info!("Credential store for {} dropped, stopping header propagation", label);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    #[tokio::test(start_paused = true)]
    async fn test_header_follows_store_after_a_tick() {
        let now = Utc::now();
        let store = CredentialStore::new(Credential::new("first", now));
        let (header, handle) =
            spawn_header_propagation(&store, Duration::from_secs(10), "test".into());

        assert_eq!(header.current(), "Bearer first");

        store.replace(Credential::new("second", now + ChronoDuration::minutes(14)));
        // not yet propagated
        assert_eq!(header.current(), "Bearer first");

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(header.current(), "Bearer second");
        assert!(header.current().is_sensitive());

        handle.abort();
    }
}
