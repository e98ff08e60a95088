//! HTTP routes.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/` | browser UI |
//! | GET | `/auth/login` | redirect to Google consent |
//! | GET | `/auth/callback` | code exchange, redirect home |
//! | GET | `/auth/status` | `{authenticated, user}` |
//! | POST | `/auth/logout` | drop the session |
//! | GET | `/events` | next upcoming events |

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use cheerlist_core::UpcomingEvent;

use crate::error::{AppResult, found};
use crate::session::{CallbackParams, SessionManager};
use crate::ui::INDEX_HTML;

/// State shared by all routes.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
}

impl AppState {
    pub fn new(session: SessionManager) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}

/// Body of `/auth/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub user: Option<String>,
}

/// Body of `/auth/logout`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of `/events`, for both outcomes.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<UpcomingEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl EventsResponse {
    pub fn success(events: Vec<UpcomingEvent>) -> Self {
        Self {
            success: true,
            error: None,
            count: Some(events.len()),
            events,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            events: Vec::new(),
            count: None,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/status", get(status))
        .route("/auth/logout", post(logout))
        .route("/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn login(State(state): State<AppState>) -> AppResult<Response> {
    let url = state.session.initiate()?;
    Ok(found(&url))
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.session.complete(params).await {
        Ok(_) => found("/?success=true"),
        Err(err) => err.into_error_redirect(),
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        authenticated: state.session.is_authenticated(),
        user: state.session.user().map(String::from),
    })
}

async fn logout(State(state): State<AppState>) -> Json<MessageResponse> {
    state.session.logout();
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

async fn events(State(state): State<AppState>) -> Response {
    match state.session.fetch_upcoming().await {
        Ok(events) => Json(EventsResponse::success(events)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cheerlist_core::EventStart;

    #[test]
    fn success_body_shape() {
        let body = EventsResponse::success(vec![UpcomingEvent::new(
            None,
            EventStart::Date("2024-03-16".to_string()),
            None,
        )]);
        insta::assert_json_snapshot!(body, @r###"
        {
          "success": true,
          "events": [
            {
              "summary": "No title",
              "start": "2024-03-16",
              "description": ""
            }
          ],
          "count": 1
        }
        "###);
    }

    #[test]
    fn failure_body_shape() {
        insta::assert_json_snapshot!(EventsResponse::failure("request timeout"), @r###"
        {
          "success": false,
          "error": "request timeout",
          "events": []
        }
        "###);
    }
}
