//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use cheerlist_core::TracingOutputFormat;
use cheerlist_providers::google::GoogleConfig;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// cheerlist - your next Google Calendar events in the browser
#[derive(Debug, Parser)]
#[command(name = "cheerlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "CHEERLIST_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, env = "CHEERLIST_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "CHEERLIST_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingOutputFormat,

    // --- Google OAuth client ---
    /// OAuth client ID from Google Cloud Console
    #[arg(long, env = "GOOGLE_CLIENT_ID", hide_env_values = true)]
    pub google_client_id: Option<String>,

    /// OAuth client secret from Google Cloud Console
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: Option<String>,

    /// Redirect URI registered for the OAuth client
    #[arg(long, env = "GOOGLE_REDIRECT_URI")]
    pub google_redirect_uri: Option<String>,

    /// Google client JSON file; fills any of the settings above left unset
    #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
    pub google_credentials_file: Option<PathBuf>,

    /// Reserved for session signing
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,
}

impl Cli {
    /// Builds the server configuration from the parsed arguments.
    pub fn into_config(self) -> ServerResult<ServerConfig> {
        let mut google = GoogleConfig::default()
            .with_client_id(self.google_client_id)
            .with_client_secret(self.google_client_secret)
            .with_redirect_uri(self.google_redirect_uri);

        if let Some(path) = self.google_credentials_file {
            google = google.merge_credentials_file(path)?;
        }

        Ok(ServerConfig::new(google)
            .with_host(self.host)
            .with_port(self.port)
            .with_secret_key(self.secret_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "cheerlist",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--log-format",
            "json",
            "--google-client-id",
            "id",
            "--google-client-secret",
            "secret",
            "--google-redirect-uri",
            "http://localhost:9000/auth/callback",
        ])
        .unwrap();

        assert_eq!(cli.log_format, TracingOutputFormat::Json);
        let config = cli.into_config().unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.google.is_configured());
        assert_eq!(
            config.google.credentials().unwrap().redirect_uri,
            "http://localhost:9000/auth/callback"
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["cheerlist", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn missing_credentials_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "cheerlist",
            "--google-credentials-file",
            "/nonexistent/cheerlist/client.json",
        ])
        .unwrap();
        assert!(cli.into_config().is_err());
    }
}
