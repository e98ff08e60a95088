//! Upcoming event types.
//!
//! - [`UpcomingEvent`]: the display shape sent to the browser
//! - [`EventStart`]: a start that is either a timed instant or an all-day date

use serde::Serialize;

/// Title used when the provider returns an event without a summary.
pub const DEFAULT_TITLE: &str = "No title";

/// The start of an event, kept exactly as the provider sent it.
///
/// All-day events carry only a date (`2024-03-15`); timed events carry an
/// RFC 3339 date-time. Neither is reparsed, so the browser sees the
/// provider's string unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventStart {
    /// A timed start (`dateTime` field).
    DateTime(String),
    /// An all-day start (`date` field).
    Date(String),
}

impl EventStart {
    /// Picks the timed start when present, falling back to the all-day date.
    pub fn from_parts(date_time: Option<String>, date: Option<String>) -> Option<Self> {
        match (date_time, date) {
            (Some(dt), _) => Some(Self::DateTime(dt)),
            (None, Some(d)) => Some(Self::Date(d)),
            (None, None) => None,
        }
    }

    /// Returns the provider string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DateTime(s) | Self::Date(s) => s,
        }
    }

    /// Returns true for all-day (date-only) starts.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// An upcoming calendar event as shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingEvent {
    /// Event title, [`DEFAULT_TITLE`] when the provider has none.
    pub summary: String,
    /// Event start.
    pub start: EventStart,
    /// Event description, empty when the provider has none.
    pub description: String,
}

impl UpcomingEvent {
    /// Builds an event, applying the title and description defaults.
    pub fn new(summary: Option<String>, start: EventStart, description: Option<String>) -> Self {
        Self {
            summary: summary.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            start,
            description: description.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_prefers_date_time() {
        let start = EventStart::from_parts(
            Some("2024-03-15T10:00:00-04:00".to_string()),
            Some("2024-03-15".to_string()),
        );
        assert_eq!(
            start,
            Some(EventStart::DateTime("2024-03-15T10:00:00-04:00".to_string()))
        );
    }

    #[test]
    fn start_falls_back_to_date() {
        let start = EventStart::from_parts(None, Some("2024-03-15".to_string())).unwrap();
        assert!(start.is_all_day());
        assert_eq!(start.as_str(), "2024-03-15");
    }

    #[test]
    fn start_missing() {
        assert!(EventStart::from_parts(None, None).is_none());
    }

    #[test]
    fn defaults_applied() {
        let event = UpcomingEvent::new(None, EventStart::Date("2024-03-15".to_string()), None);
        assert_eq!(event.summary, "No title");
        assert_eq!(event.description, "");
    }

    #[test]
    fn serializes_start_as_plain_string() {
        let event = UpcomingEvent::new(
            Some("Standup".to_string()),
            EventStart::DateTime("2024-03-15T09:30:00Z".to_string()),
            Some("Daily sync".to_string()),
        );
        insta::assert_json_snapshot!(event, @r###"
        {
          "summary": "Standup",
          "start": "2024-03-15T09:30:00Z",
          "description": "Daily sync"
        }
        "###);
    }

    #[test]
    fn all_day_start_round_trips_untouched() {
        let json = serde_json::to_string(&EventStart::Date("2024-12-25".to_string())).unwrap();
        assert_eq!(json, "\"2024-12-25\"");
    }
}
