//! Google Calendar provider: OAuth client construction and the
//! refresh-then-list event fetch.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use cheerlist_core::UpcomingEvent;

use crate::error::{ProviderError, ProviderResult};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::{OAuthClient, refresh_bundle};
use super::tokens::{CredentialStore, SessionKey, TokenBundle};

/// Google Calendar provider.
///
/// Owns one HTTP client shared by the OAuth and Calendar calls, and writes
/// refreshed tokens back to the credential store.
pub struct GoogleProvider {
    config: GoogleConfig,
    http_client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
}

impl GoogleProvider {
    /// Creates a new Google provider with the given configuration.
    ///
    /// Missing client settings are not an error here; they are reported by
    /// [`GoogleProvider::oauth_client`].
    pub fn new(config: GoogleConfig, store: Arc<dyn CredentialStore>) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
            store,
        })
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Returns the credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Builds an OAuth client, failing with a configuration error if the
    /// client settings are incomplete.
    pub fn oauth_client(&self) -> ProviderResult<OAuthClient> {
        OAuthClient::new(&self.config, self.http_client.clone())
    }

    /// Fetches the next upcoming events for `bundle`.
    ///
    /// An expired access token is refreshed once when a refresh token is
    /// present, and the refreshed bundle is written back under `key`.
    /// Without a refresh token the list call is still made, and its
    /// rejection surfaces as an expired-authentication error.
    pub async fn fetch_upcoming(
        &self,
        key: &SessionKey,
        mut bundle: TokenBundle,
    ) -> ProviderResult<Vec<UpcomingEvent>> {
        if bundle.is_expired() {
            if bundle.can_refresh() {
                refresh_bundle(&self.http_client, &mut bundle).await?;
                if !self.store.replace_existing(key, bundle.clone()) {
                    warn!(session = %key, "session logged out during token refresh");
                }
            } else {
                debug!(session = %key, "access token expired and no refresh token available");
            }
        }

        let client = GoogleCalendarClient::new(
            self.http_client.clone(),
            &self.config.api_base,
            &bundle.access_token,
        );

        let events = client
            .list_upcoming(&self.config.calendar_id, Utc::now(), self.config.max_results)
            .await?;

        info!(session = %key, count = events.len(), "fetched upcoming events");
        Ok(events)
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
