//! Server configuration.

use std::net::SocketAddr;

use cheerlist_providers::google::GoogleConfig;

use crate::error::{ServerError, ServerResult};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Google OAuth client and API settings.
    pub google: GoogleConfig,

    /// Reserved for signing session cookies; not used yet.
    pub secret_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            google: GoogleConfig::default(),
            secret_key: None,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration with the given Google settings.
    pub fn new(google: GoogleConfig) -> Self {
        Self {
            google,
            ..Default::default()
        }
    }

    /// Builder: set host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Builder: set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set secret key.
    pub fn with_secret_key(mut self, secret_key: Option<String>) -> Self {
        self.secret_key = secret_key;
        self
    }

    /// Returns the socket address to bind.
    pub fn addr(&self) -> ServerResult<SocketAddr> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| ServerError::config(format!("invalid listen address '{}': {}", host, e)))
    }
}
