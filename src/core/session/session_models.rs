// The session is the single place that knows who the user is and whether
// we are allowed to talk to Google Drive on their behalf.
//
// Two independent flows feed it: the identity sign-in (who) and the storage
// token grant (what we may touch). Instead of checking a view-level "user"
// and a separate token slot, callers ask the session.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub email: Option<String>,
}

/// OAuth access token scoped to the document-storage permission.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

impl AccessToken {
    pub fn new(
        secret: impl Into<String>,
        expires_at: DateTime<Utc>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
            scope: scope.into(),
        }
    }

    /// Builds a token that expires `expires_in_secs` seconds from now.
    pub fn expiring_in(
        secret: impl Into<String>,
        expires_in_secs: i64,
        scope: impl Into<String>,
    ) -> Self {
        Self::new(secret, Utc::now() + Duration::seconds(expires_in_secs), scope)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.secret.is_empty() && self.expires_at > now
    }
}

// Keep the bearer secret out of logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Everything we know about the current user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
    token: Option<AccessToken>,
}

impl Session {
    /// The installed token, if any and not yet expired.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token
            .as_ref()
            .filter(|token| token.is_valid_at(Utc::now()))
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Signed in AND holding a usable storage token.
    pub fn is_fully_authorized(&self) -> bool {
        self.is_signed_in() && self.token().is_some()
    }
}

/// Shared handle to the session, passed explicitly to whoever needs it.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn identity(&self) -> Option<Identity> {
        self.inner.read().await.identity.clone()
    }

    pub async fn token(&self) -> Option<AccessToken> {
        self.inner.read().await.token().cloned()
    }

    pub async fn is_fully_authorized(&self) -> bool {
        self.inner.read().await.is_fully_authorized()
    }

    pub async fn set_identity(&self, identity: Identity) {
        self.inner.write().await.identity = Some(identity);
    }

    pub async fn install_token(&self, token: AccessToken) {
        self.inner.write().await.token = Some(token);
    }

    pub async fn sign_out(&self) {
        let mut session = self.inner.write().await;
        session.identity = None;
        session.token = None;
    }
}
