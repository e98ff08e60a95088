//! OAuth 2.0 authorization-code flow for Google web applications.
//!
//! # Flow Overview
//!
//! 1. Build the authorization URL (offline access, incremental consent)
//! 2. The browser is redirected to Google's consent page
//! 3. Google redirects back to the configured callback with a `code`
//! 4. Exchange the code for access and refresh tokens
//! 5. Later, trade the refresh token for a new access token when needed

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleConfig, OAuthCredentials};
use super::tokens::{TokenBundle, expires_at_from};

/// Length of the random `state` value, in bytes before encoding.
const STATE_LENGTH: usize = 16;

/// OAuth client for Google APIs.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    auth_url: String,
    token_url: String,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates an OAuth client from the configuration.
    ///
    /// Fails with a configuration error when any client setting is missing,
    /// before any request is made.
    pub fn new(config: &GoogleConfig, http_client: reqwest::Client) -> ProviderResult<Self> {
        Ok(Self {
            credentials: config.credentials()?,
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            http_client,
        })
    }

    /// Returns the client settings in use.
    pub fn credentials(&self) -> &OAuthCredentials {
        &self.credentials
    }

    /// Builds the Google OAuth authorization URL.
    ///
    /// Requests offline access so a refresh token is issued, and incremental
    /// consent so previously granted scopes are kept.
    pub fn authorization_url(&self, scopes: &[String], state: &str) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&\
            state={}&access_type=offline&include_granted_scopes=true",
            self.auth_url,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code for a token bundle.
    pub async fn exchange_code(&self, code: &str, scopes: &[String]) -> ProviderResult<TokenBundle> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];

        let token_response =
            post_token_request(&self.http_client, &self.token_url, &params, "token exchange")
                .await?;

        info!("successfully obtained tokens");
        let granted_scopes = token_response
            .granted_scopes()
            .unwrap_or_else(|| scopes.to_vec());

        Ok(TokenBundle {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            token_uri: self.token_url.clone(),
            client_id: self.credentials.client_id.clone(),
            client_secret: self.credentials.client_secret.clone(),
            scopes: granted_scopes,
            expires_at: expires_at_from(token_response.expires_in),
        })
    }
}

/// Refreshes the access token of `bundle` in place.
///
/// Uses the token endpoint and client settings stored in the bundle itself,
/// so a bundle stays usable even if the server configuration changes.
pub async fn refresh_bundle(
    http_client: &reqwest::Client,
    bundle: &mut TokenBundle,
) -> ProviderResult<()> {
    let refresh_token = bundle
        .refresh_token
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ProviderError::expired("no refresh token - re-authentication required")
        })?;

    let params = [
        ("client_id", bundle.client_id.as_str()),
        ("client_secret", bundle.client_secret.as_str()),
        ("refresh_token", refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    debug!("refreshing expired access token");
    let token_response =
        post_token_request(http_client, &bundle.token_uri, &params, "token refresh").await?;

    info!("successfully refreshed access token");
    bundle.apply_refresh(
        token_response.access_token,
        token_response.refresh_token,
        token_response.expires_in,
    );
    Ok(())
}

/// Generates a random `state` value for the authorization request.
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..STATE_LENGTH).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

async fn post_token_request(
    http_client: &reqwest::Client,
    token_url: &str,
    params: &[(&str, &str)],
    what: &str,
) -> ProviderResult<TokenResponse> {
    let response = http_client
        .post(token_url)
        .form(params)
        .send()
        .await
        .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("({}) {}", err.error, description),
                None => format!("({})", err.error),
            },
            Err(_) => body,
        };
        return Err(ProviderError::authentication(format!(
            "{} failed ({}): {}",
            what, status, detail
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|scopes| !scopes.is_empty())
    }
}

/// Error body from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
