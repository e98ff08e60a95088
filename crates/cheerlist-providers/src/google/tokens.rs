//! OAuth token bundles and the in-memory credential store.
//!
//! A [`TokenBundle`] holds everything needed to call the Calendar API on a
//! user's behalf, including the client settings needed to refresh it. Bundles
//! live in a [`CredentialStore`] keyed by [`SessionKey`]; nothing is written
//! to disk.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Seconds subtracted from `expires_in` so a token is refreshed before
/// Google stops accepting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Identifies whose credentials a bundle belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// The single session used by the server.
    pub const DEFAULT_USER: &'static str = "default_user";

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn default_user() -> Self {
        Self::new(Self::DEFAULT_USER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::default_user()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The credentials needed to call Google on a user's behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenBundle {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// Token endpoint used for refreshes.
    pub token_uri: String,

    pub client_id: String,
    pub client_secret: String,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,

    /// When the access token expires, if the provider said.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenBundle {
    /// Returns true if the access token is missing, expired or about to
    /// expire.
    pub fn is_expired(&self) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            // No expiry reported: treat as valid until the API says otherwise
            None => false,
        }
    }

    /// Returns true if the token can be refreshed without user interaction.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Applies the result of a refresh. The refresh token is replaced only
    /// when the provider issued a new one.
    pub fn apply_refresh(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expires_at = expires_at_from(expires_in_secs);
    }
}

// Tokens and the client secret stay out of logs.
impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Converts an `expires_in` value into an absolute expiry with a safety
/// margin.
///
/// Values outside chrono's range yield `None`, the same as a response that
/// carries no expiry.
pub fn expires_at_from(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    let secs = expires_in_secs?.saturating_sub(EXPIRY_MARGIN_SECS);
    let expires_at = Duration::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d));
    if expires_at.is_none() {
        debug!(expires_in = secs, "ignoring out-of-range token lifetime");
    }
    expires_at
}

/// Storage for token bundles, one per session.
pub trait CredentialStore: Send + Sync {
    /// Returns a copy of the bundle for `key`.
    fn get(&self, key: &SessionKey) -> Option<TokenBundle>;

    /// Stores `bundle` under `key`, replacing any previous one.
    fn put(&self, key: &SessionKey, bundle: TokenBundle);

    /// Removes the bundle for `key`, returning it if one existed.
    fn remove(&self, key: &SessionKey) -> Option<TokenBundle>;

    /// Writes back a refreshed bundle, but only if the session still has
    /// one. Returns false when the session was logged out meanwhile.
    fn replace_existing(&self, key: &SessionKey, bundle: TokenBundle) -> bool;

    /// Returns true if a bundle exists for `key`.
    fn contains(&self, key: &SessionKey) -> bool {
        self.get(key).is_some()
    }
}

/// Process-lifetime credential store guarded by a lock.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    bundles: RwLock<HashMap<SessionKey, TokenBundle>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &SessionKey) -> Option<TokenBundle> {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &SessionKey, bundle: TokenBundle) {
        debug!(session = %key, "storing token bundle");
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), bundle);
    }

    fn remove(&self, key: &SessionKey) -> Option<TokenBundle> {
        let removed = self
            .bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if removed.is_some() {
            debug!(session = %key, "removed token bundle");
        }
        removed
    }

    fn replace_existing(&self, key: &SessionKey, bundle: TokenBundle) -> bool {
        let mut bundles = self.bundles.write().unwrap_or_else(PoisonError::into_inner);
        match bundles.get_mut(key) {
            Some(slot) => {
                *slot = bundle;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(access_token: &str) -> TokenBundle {
        TokenBundle {
            access_token: access_token.to_string(),
            refresh_token: Some("refresh-token".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec!["scope1".to_string()],
            expires_at: expires_at_from(Some(3600)),
        }
    }

    #[test]
    fn fresh_token_not_expired() {
        let token = bundle("access");
        assert!(!token.is_expired());
        assert!(token.can_refresh());
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut token = bundle("access");
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());
    }

    #[test]
    fn empty_access_token_is_expired() {
        let mut token = bundle("");
        token.expires_at = None;
        assert!(token.is_expired());
    }

    #[test]
    fn no_expiry_is_valid() {
        let mut token = bundle("access");
        token.expires_at = None;
        assert!(!token.is_expired());
    }

    #[test]
    fn short_lifetime_counts_as_expired() {
        let mut token = bundle("access");
        token.expires_at = expires_at_from(Some(30));
        assert!(token.is_expired());
    }

    #[test]
    fn out_of_range_lifetime_has_no_expiry() {
        for secs in [i64::MAX, i64::MIN, 9_000_000_000_000_000] {
            assert_eq!(expires_at_from(Some(secs)), None, "expires_in = {secs}");
        }
    }

    #[test]
    fn refresh_with_out_of_range_lifetime() {
        let mut token = bundle("old");
        token.apply_refresh("new", None, Some(i64::MAX));
        assert_eq!(token.access_token, "new");
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired());
    }

    #[test]
    fn refresh_keeps_refresh_token_when_not_reissued() {
        let mut token = bundle("old");
        token.apply_refresh("new", None, Some(3600));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-token"));
        assert!(!token.is_expired());

        token.apply_refresh("newer", Some("rotated".to_string()), None);
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", bundle("super-secret-access"));
        assert!(!rendered.contains("super-secret-access"));
        assert!(!rendered.contains("refresh-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn store_put_get_remove() {
        let store = MemoryCredentialStore::new();
        let key = SessionKey::default_user();
        assert!(!store.contains(&key));

        store.put(&key, bundle("access"));
        assert!(store.contains(&key));
        assert_eq!(store.get(&key).unwrap().access_token, "access");
        assert_eq!(store.len(), 1);

        assert!(store.remove(&key).is_some());
        assert!(store.remove(&key).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn replace_existing_skips_logged_out_session() {
        let store = MemoryCredentialStore::new();
        let key = SessionKey::default_user();
        assert!(!store.replace_existing(&key, bundle("refreshed")));
        assert!(store.get(&key).is_none());

        store.put(&key, bundle("access"));
        assert!(store.replace_existing(&key, bundle("refreshed")));
        assert_eq!(store.get(&key).unwrap().access_token, "refreshed");
    }

    #[test]
    fn sessions_are_independent() {
        let store = MemoryCredentialStore::new();
        let alice = SessionKey::new("alice");
        store.put(&alice, bundle("a"));
        assert!(!store.contains(&SessionKey::default_user()));
        assert_eq!(SessionKey::default().as_str(), "default_user");
    }
}
