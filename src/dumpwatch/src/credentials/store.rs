use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::Credential;

/// Holds the current credential for one cluster client.
///
/// Reads never wait on a refresh: they clone the `Arc` of whichever
/// snapshot is current. A replacement is ignored if it would move the
/// expiry backwards, so observers only ever see fresher values.
#[derive(Clone)]
pub struct CredentialStore {
    tx: Arc<watch::Sender<Arc<Credential>>>,
}

impl CredentialStore {
    pub fn new(initial: Credential) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    pub fn read(&self) -> Arc<Credential> {
        self.tx.borrow().clone()
    }

    /// Swaps in `credential`; returns false when it was older than the
    /// stored one and therefore dropped.
    pub fn replace(&self, credential: Credential) -> bool {
        self.tx.send_if_modified(|current| {
            if credential.expires_at() < current.expires_at() {
                return false;
            }
            *current = Arc::new(credential);
            true
        })
    }

    pub fn is_near_expiry(&self, buffer: Duration) -> bool {
        self.is_near_expiry_at(buffer, Utc::now())
    }

    pub fn is_near_expiry_at(&self, buffer: Duration, now: DateTime<Utc>) -> bool {
        self.read().is_near_expiry_at(buffer, now)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Credential>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    #[test]
    fn test_read_returns_latest_replacement() {
        let store = CredentialStore::new(Credential::new("a", at(0)));
        assert!(store.replace(Credential::new("b", at(900))));
        assert_eq!(store.read().token(), "b");
        assert_eq!(store.read().expires_at(), at(900));
    }

    #[test]
    fn test_replace_never_moves_expiry_backwards() {
        let store = CredentialStore::new(Credential::new("fresh", at(900)));
        assert!(!store.replace(Credential::new("stale", at(100))));
        assert_eq!(store.read().token(), "fresh");
    }

    #[test]
    fn test_observed_expiry_is_monotonic() {
        let store = CredentialStore::new(Credential::new("t0", at(0)));
        let history = [300, 120, 600, 600, 10, 1200, 900];
        let mut last_seen = store.read().expires_at();
        for (i, offset) in history.iter().enumerate() {
            store.replace(Credential::new(format!("t{}", i + 1), at(*offset)));
            let seen = store.read().expires_at();
            assert!(seen >= last_seen);
            last_seen = seen;
        }
        assert_eq!(last_seen, at(1200));
    }

    #[test]
    fn test_near_expiry_uses_buffer() {
        let store = CredentialStore::new(Credential::new("t", at(100)));
        assert!(!store.is_near_expiry_at(Duration::seconds(60), at(0)));
        assert!(store.is_near_expiry_at(Duration::seconds(60), at(40)));
        assert!(store.is_near_expiry_at(Duration::seconds(60), at(200)));
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_whole_values() {
        let store = CredentialStore::new(Credential::new("token-0", at(0)));
        let mut readers = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..500 {
                    let credential = store.read();
                    let n: i64 = credential.token()["token-".len()..].parse().unwrap();
                    assert_eq!(credential.expires_at(), at(n));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for n in 1..=500 {
            store.replace(Credential::new(format!("token-{n}"), at(n)));
            tokio::task::yield_now().await;
        }
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
