//! Google Calendar provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// OAuth 2.0 web-application credentials, all three values present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
    /// Where Google sends the browser back after consent.
    pub redirect_uri: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }
}

/// Structure of Google's OAuth client JSON file.
///
/// Supports the Cloud Console download (`web` or `installed` section) and
/// a flat object with the fields at the root.
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    web: Option<NestedCredentials>,
    installed: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// Configuration for the Google OAuth flow and Calendar API.
///
/// The client settings are optional here: a server may start without them,
/// and [`GoogleConfig::credentials`] reports what is missing at the point
/// of use.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,

    /// OAuth scopes to request.
    ///
    /// Defaults to `["https://www.googleapis.com/auth/calendar.readonly"]`.
    pub scopes: Vec<String>,

    /// Calendar to read from.
    pub calendar_id: String,

    /// Number of upcoming events to request.
    pub max_results: usize,

    pub auth_url: String,
    pub token_url: String,
    pub api_base: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            calendar_id: "primary".to_string(),
            max_results: Self::DEFAULT_MAX_RESULTS,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            api_base: CALENDAR_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("cheerlist/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("calendar_id", &self.calendar_id)
            .field("max_results", &self.max_results)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default number of upcoming events.
    pub const DEFAULT_MAX_RESULTS: usize = 10;

    /// Default OAuth scope for read-only calendar access.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Creates a configuration from already-known client settings.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            client_id: Some(credentials.client_id),
            client_secret: Some(credentials.client_secret),
            redirect_uri: Some(credentials.redirect_uri),
            ..Self::default()
        }
    }

    /// Sets the client ID.
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    /// Sets the client secret.
    pub fn with_client_secret(mut self, client_secret: Option<String>) -> Self {
        self.client_secret = client_secret;
        self
    }

    /// Sets the redirect URI.
    pub fn with_redirect_uri(mut self, redirect_uri: Option<String>) -> Self {
        self.redirect_uri = redirect_uri;
        self
    }

    /// Points the OAuth and Calendar endpoints at another server.
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Fills unset client settings from a Google client JSON file.
    ///
    /// Values already present (e.g. from the environment) win over the file.
    pub fn merge_credentials_file(self, path: impl AsRef<Path>) -> ProviderResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProviderError::configuration(format!("failed to read credentials file: {}", e))
                .with_source(e)
        })?;
        self.merge_credentials_json(&content)
    }

    /// Fills unset client settings from a Google client JSON string.
    pub fn merge_credentials_json(mut self, json: &str) -> ProviderResult<Self> {
        let file: GoogleCredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        let (client_id, client_secret, redirect_uris) = match file.web.or(file.installed) {
            Some(nested) => (
                Some(nested.client_id),
                Some(nested.client_secret),
                nested.redirect_uris,
            ),
            None => (file.client_id, file.client_secret, file.redirect_uris),
        };

        if client_id.is_none() || client_secret.is_none() {
            return Err(ProviderError::configuration(
                "credentials file must contain a 'web'/'installed' section or 'client_id'/'client_secret' at root level",
            ));
        }

        self.client_id = self.client_id.or(client_id);
        self.client_secret = self.client_secret.or(client_secret);
        self.redirect_uri = self.redirect_uri.or(redirect_uris.into_iter().next());
        Ok(self)
    }

    /// Returns the client settings, or a configuration error naming every
    /// missing variable.
    pub fn credentials(&self) -> ProviderResult<OAuthCredentials> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let client_id = present(&self.client_id);
        let client_secret = present(&self.client_secret);
        let redirect_uri = present(&self.redirect_uri);

        match (client_id, client_secret, redirect_uri) {
            (Some(id), Some(secret), Some(redirect)) => {
                Ok(OAuthCredentials::new(id, secret, redirect))
            }
            _ => {
                let missing: Vec<&str> = [
                    ("GOOGLE_CLIENT_ID", client_id.is_none()),
                    ("GOOGLE_CLIENT_SECRET", client_secret.is_none()),
                    ("GOOGLE_REDIRECT_URI", redirect_uri.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();
                Err(ProviderError::configuration(format!(
                    "Google OAuth credentials not configured. Please set {} in .env file",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Returns true when all client settings are present.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}
