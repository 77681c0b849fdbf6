use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::store::CredentialStore;
use crate::types::Credential;

/// Upstream that exchanges a signed identity for a short-lived token.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_token(&self) -> Result<String>;

    /// Fixed lifetime of an issued token. The issuer never reports the
    /// expiry itself; the refresher stamps it at issuance time.
    fn validity(&self) -> Duration;

    fn describe(&self) -> String;
}

#[derive(Clone, Debug)]
pub struct RefreshSettings {
    pub interval: std::time::Duration,
    pub failure_backoff: std::time::Duration,
    pub expiry_buffer: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(10),
            failure_backoff: std::time::Duration::from_secs(5),
            expiry_buffer: Duration::seconds(60),
        }
    }
}

/// Keeps a [`CredentialStore`] fresh by re-issuing the token shortly
/// before it expires.
pub struct CredentialRefresher {
    store: CredentialStore,
    issuer: Arc<dyn TokenIssuer>,
    settings: RefreshSettings,
}

impl CredentialRefresher {
    /// Issues the first token and builds a store around it.
    pub async fn bootstrap(issuer: Arc<dyn TokenIssuer>, settings: RefreshSettings) -> Result<Self> {
        let credential = issue(issuer.as_ref(), Utc::now()).await?;
        info!(
            "Issued initial token for {}, expires at {}",
            issuer.describe(),
            credential.expires_at()
        );

        Ok(Self {
            store: CredentialStore::new(credential),
            issuer,
            settings,
        })
    }

    pub fn store(&self) -> CredentialStore {
        self.store.clone()
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// One scheduling step: refresh if `now` is inside the expiry buffer.
    /// Returns whether a new credential was installed.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<bool> {
        if !self.store.is_near_expiry_at(self.settings.expiry_buffer, now) {
            return Ok(false);
        }

        let remaining = self.store.read().expires_at() - now;
        info!(
            "Token for {} expires in {}s, refreshing",
            self.issuer.describe(),
            remaining.num_seconds()
        );
        let credential = issue(self.issuer.as_ref(), now).await?;
        Ok(self.store.replace(credential))
    }

    /// Runs forever. Issuance failures are logged and retried after the
    /// short backoff; they never end the loop.
    pub async fn run(self: Arc<Self>) {
        loop {
            debug!("Token refresh loop for {}", self.issuer.describe());
            match self.tick(Utc::now()).await {
                Ok(_) => tokio::time::sleep(self.settings.interval).await,
                Err(e) => {
                    error!("Error in token refresh loop for {}: {:#}", self.issuer.describe(), e);
                    tokio::time::sleep(self.settings.failure_backoff).await;
                }
            }
        }
    }
}

async fn issue(issuer: &dyn TokenIssuer, now: DateTime<Utc>) -> Result<Credential> {
    let token = issuer.issue_token().await?;
    Ok(Credential::new(token, now + issuer.validity()))
}
