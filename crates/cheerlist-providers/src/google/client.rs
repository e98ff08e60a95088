//! Google Calendar API client.
//!
//! Low-level HTTP client for the `events.list` endpoint: request building,
//! status mapping and response parsing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use cheerlist_core::{EventStart, UpcomingEvent};

use crate::error::{ProviderError, ProviderResult};

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a new Google Calendar client with the given access token.
    pub fn new(
        http_client: reqwest::Client,
        api_base: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
            access_token: access_token.into(),
        }
    }

    /// Lists upcoming events from a calendar.
    ///
    /// Issues a single request: events starting after `time_min`, recurring
    /// events expanded into instances, ordered by start time, capped at
    /// `max_results`. Provider order is kept.
    pub async fn list_upcoming(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        max_results: usize,
    ) -> ProviderResult<Vec<UpcomingEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                (
                    "timeMin",
                    time_min.to_rfc3339_opts(SecondsFormat::Micros, true),
                ),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::expired(
                "access token expired or invalid - reconnect Google Calendar",
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization("access denied to calendar"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        let mut events: Vec<UpcomingEvent> =
            list.items.into_iter().filter_map(convert_event).collect();
        events.truncate(max_results);

        debug!("fetched {} events from calendar {}", events.len(), calendar_id);
        Ok(events)
    }
}

/// Converts an API event to the display shape, keeping the start string
/// verbatim.
fn convert_event(event: ApiEvent) -> Option<UpcomingEvent> {
    let start = event
        .start
        .and_then(|s| EventStart::from_parts(s.date_time, s.date));

    let Some(start) = start else {
        warn!(
            "event {} has no start time, skipping",
            event.id.as_deref().unwrap_or("<unknown>")
        );
        return None;
    };

    trace!(start = start.as_str(), all_day = start.is_all_day(), "converted event");
    Some(UpcomingEvent::new(event.summary, start, event.description))
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<ApiEventTime>,
}

/// Event time from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "kind": "calendar#events",
            "items": [
                {
                    "id": "event1",
                    "summary": "Test Meeting",
                    "start": {
                        "dateTime": "2024-03-15T10:00:00-04:00",
                        "timeZone": "America/New_York"
                    },
                    "end": {
                        "dateTime": "2024-03-15T11:00:00-04:00"
                    },
                    "status": "confirmed"
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].summary, Some("Test Meeting".to_string()));
    }

    #[test]
    fn parse_empty_list() {
        let response: EventListResponse = serde_json::from_str(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn convert_all_day_event() {
        let json = r#"{
            "id": "event1",
            "start": { "date": "2024-03-15" },
            "end": { "date": "2024-03-16" }
        }"#;

        let event: ApiEvent = serde_json::from_str(json).unwrap();
        let converted = convert_event(event).unwrap();
        assert_eq!(converted.start, EventStart::Date("2024-03-15".to_string()));
        assert_eq!(converted.summary, "No title");
        assert_eq!(converted.description, "");
    }

    #[test]
    fn convert_event_without_start_is_skipped() {
        let event: ApiEvent = serde_json::from_str(r#"{"id": "broken"}"#).unwrap();
        assert!(convert_event(event).is_none());
    }

    #[tokio::test]
    async fn list_upcoming_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer access-token"))
            .and(query_param("maxResults", "10"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("timeMin", "2024-03-15T08:00:00.000000Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    { "summary": "Holiday", "start": { "date": "2024-03-16" } },
                    {
                        "summary": "Review",
                        "description": "Quarterly",
                        "start": { "dateTime": "2024-03-16T09:00:00+01:00" }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::new(reqwest::Client::new(), server.uri(), "access-token");
        let time_min = DateTime::parse_from_rfc3339("2024-03-15T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let events = client.list_upcoming("primary", time_min, 10).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start.as_str(), "2024-03-16");
        assert!(events[0].start.is_all_day());
        assert_eq!(events[1].start.as_str(), "2024-03-16T09:00:00+01:00");
        assert_eq!(events[1].description, "Quarterly");
    }

    #[tokio::test]
    async fn list_upcoming_caps_results() {
        let server = MockServer::start().await;
        let items: Vec<_> = (0..12)
            .map(|i| serde_json::json!({ "summary": format!("e{i}"), "start": { "date": "2024-03-16" } }))
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": items })))
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::new(reqwest::Client::new(), server.uri(), "t");
        let events = client.list_upcoming("primary", Utc::now(), 10).await.unwrap();
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].summary, "e0");
        assert_eq!(events[9].summary, "e9");
    }

    #[tokio::test]
    async fn list_upcoming_status_mapping() {
        let cases = [
            (401, ProviderErrorCode::AuthenticationExpired),
            (403, ProviderErrorCode::AuthorizationFailed),
            (429, ProviderErrorCode::RateLimited),
            (500, ProviderErrorCode::ServerError),
        ];

        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let client = GoogleCalendarClient::new(reqwest::Client::new(), server.uri(), "t");
            let err = client
                .list_upcoming("primary", Utc::now(), 10)
                .await
                .unwrap_err();
            assert_eq!(err.code(), expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn list_upcoming_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GoogleCalendarClient::new(reqwest::Client::new(), server.uri(), "t");
        let err = client
            .list_upcoming("primary", Utc::now(), 10)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }
}
