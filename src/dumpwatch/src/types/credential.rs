use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// A bearer token and the instant it stops being accepted.
///
/// Values are replaced wholesale, never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_near_expiry_at(&self, buffer: Duration, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - buffer
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// tokens must never reach the logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
