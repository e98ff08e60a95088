//! OAuth session lifecycle.
//!
//! A session moves `Unauthenticated → AuthorizationRequested → Authenticated`:
//! [`SessionManager::initiate`] issues an authorization URL and remembers its
//! `state`, [`SessionManager::complete`] exchanges the callback code and
//! stores the token bundle, and [`SessionManager::logout`] drops it.
//!
//! While a login is pending, the callback must echo its `state`. A callback
//! without `state` is accepted only when no login is pending.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use tracing::{debug, info};

use cheerlist_core::UpcomingEvent;
use cheerlist_providers::ProviderError;
use cheerlist_providers::google::{
    CredentialStore, GoogleProvider, SessionKey, TokenBundle, generate_state,
};

use crate::error::{AppError, AppResult};

/// Query parameters Google sends to the callback route.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Where a session is in the OAuth flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AuthorizationRequested,
    Authenticated,
}

/// Drives the OAuth flow for one session key.
pub struct SessionManager {
    provider: GoogleProvider,
    key: SessionKey,
    pending_state: RwLock<Option<String>>,
}

impl SessionManager {
    /// Creates a session manager for `key`.
    pub fn new(provider: GoogleProvider, key: SessionKey) -> Self {
        Self {
            provider,
            key,
            pending_state: RwLock::new(None),
        }
    }

    /// Returns the session key.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.provider.store()
    }

    /// Builds the provider authorization URL.
    ///
    /// Fails with [`AppError::Configuration`] before any network call when
    /// the OAuth client settings are incomplete.
    pub fn initiate(&self) -> AppResult<String> {
        let oauth = self
            .provider
            .oauth_client()
            .map_err(AppError::Configuration)?;

        let state = generate_state();
        let url = oauth.authorization_url(&self.provider.config().scopes, &state);
        *self
            .pending_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(state);

        debug!(redirect_uri = %oauth.credentials().redirect_uri, "using redirect URI");
        debug!(url = %url, "generated authorization URL");
        Ok(url)
    }

    /// Exchanges the callback's authorization code and stores the result.
    pub async fn complete(&self, params: CallbackParams) -> AppResult<TokenBundle> {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            return Err(AppError::Authorization(ProviderError::authorization(
                format!("authorization denied: {}", error),
            )));
        }

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(AppError::MissingCode)?;

        // A pending login's state is required and consumed either way.
        let expected = self
            .pending_state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match (expected, params.state) {
            (None, None) => {}
            (Some(expected), Some(state)) if expected == state => {}
            _ => {
                return Err(AppError::Authorization(ProviderError::authorization(
                    "OAuth state mismatch - restart the login",
                )));
            }
        }

        let oauth = self
            .provider
            .oauth_client()
            .map_err(AppError::from_authorization)?;
        let bundle = oauth
            .exchange_code(&code, &self.provider.config().scopes)
            .await
            .map_err(AppError::from_authorization)?;

        self.store().put(&self.key, bundle.clone());
        info!(session = %self.key, "authorization complete");
        Ok(bundle)
    }

    /// True iff a token bundle is stored. No validity check, no I/O.
    pub fn is_authenticated(&self) -> bool {
        self.store().contains(&self.key)
    }

    /// Returns the session's user name when authenticated.
    pub fn user(&self) -> Option<&str> {
        self.is_authenticated().then(|| self.key.as_str())
    }

    /// Returns the current state of the flow.
    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else if self
            .pending_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            SessionState::AuthorizationRequested
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Drops the stored token bundle. Idempotent.
    pub fn logout(&self) {
        if self.store().remove(&self.key).is_some() {
            info!(session = %self.key, "logged out");
        }
        *self
            .pending_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Fetches upcoming events for the session.
    ///
    /// Fails with [`AppError::AuthenticationRequired`] when no bundle is
    /// stored, and [`AppError::Upstream`] for any refresh or API failure.
    pub async fn fetch_upcoming(&self) -> AppResult<Vec<UpcomingEvent>> {
        let bundle = self
            .store()
            .get(&self.key)
            .ok_or(AppError::AuthenticationRequired)?;

        self.provider
            .fetch_upcoming(&self.key, bundle)
            .await
            .map_err(AppError::Upstream)
    }
}
