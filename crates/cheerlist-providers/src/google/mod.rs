//! Google Calendar provider implementation.
//!
//! # Authentication Flow
//!
//! 1. The server builds an authorization URL with [`OAuthClient::authorization_url`]
//! 2. The browser is redirected to Google's consent page
//! 3. Google redirects back to the callback route with an authorization code
//! 4. [`OAuthClient::exchange_code`] trades the code for a [`TokenBundle`]
//! 5. The bundle is kept in a [`CredentialStore`] for the session
//! 6. [`GoogleProvider::fetch_upcoming`] refreshes the access token when it
//!    has expired, then lists upcoming events
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cheerlist_providers::google::{GoogleConfig, GoogleProvider, MemoryCredentialStore, SessionKey};
//!
//! let store = Arc::new(MemoryCredentialStore::new());
//! let provider = GoogleProvider::new(GoogleConfig::default(), store.clone())?;
//! let key = SessionKey::default_user();
//! if let Some(bundle) = store.get(&key) {
//!     let events = provider.fetch_upcoming(&key, bundle).await?;
//! }
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{
    CALENDAR_API_BASE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GoogleConfig, OAuthCredentials,
};
pub use oauth::{OAuthClient, generate_state, refresh_bundle};
pub use provider::GoogleProvider;
pub use tokens::{CredentialStore, MemoryCredentialStore, SessionKey, TokenBundle, expires_at_from};
