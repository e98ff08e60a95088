//! Google OAuth and Calendar API access.
//!
//! - [`google::GoogleProvider`] - refresh-then-list fetch of upcoming events
//! - [`google::OAuthClient`] - authorization URL and code exchange
//! - [`google::CredentialStore`] - where token bundles live between requests
//! - [`ProviderError`] - error type for everything that talks to Google
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐
//! │  OAuthClient    │     │ GoogleCalendarClient │
//! └────────┬────────┘     └──────────┬───────────┘
//!          │ TokenBundle             │ UpcomingEvent
//!          ▼                         ▼
//! ┌─────────────────┐     ┌──────────────────────┐
//! │ CredentialStore │◀────│   GoogleProvider     │
//! └─────────────────┘     └──────────────────────┘
//! ```

pub mod error;
pub mod google;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
