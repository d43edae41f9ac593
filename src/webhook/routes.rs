//! HTTP surface — Dialogflow fulfillment webhook plus health and history endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::types::{WebhookRequest, WebhookResponse};
use crate::session::{SessionAggregator, TurnOutcome};
use crate::store::TranscriptLog;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<SessionAggregator>,
    /// Transcript log (None when transcripts are disabled).
    pub transcripts: Option<Arc<dyn TranscriptLog>>,
}

/// Build the Axum router with the webhook and REST routes.
pub fn webhook_routes(
    aggregator: Arc<SessionAggregator>,
    transcripts: Option<Arc<dyn TranscriptLog>>,
) -> Router {
    let state = AppState {
        aggregator,
        transcripts,
    };

    Router::new()
        .route("/default", post(fulfill))
        .route("/health", get(health))
        .route("/api/sessions/{id}/history", get(session_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "symptom-intake"
    }))
}

// ── Fulfillment ─────────────────────────────────────────────────────────

async fn fulfill(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request = match parse_request(&body) {
        ParsedBody::Request(value) => value,
        ParsedBody::Empty => {
            return (StatusCode::OK, Json(WebhookResponse::invalid_request()));
        }
        ParsedBody::Malformed(reason) => {
            warn!(error = %reason, "Unreadable fulfillment request");
            return (StatusCode::NOT_FOUND, Json(WebhookResponse::not_found()));
        }
    };

    let request: WebhookRequest = match serde_json::from_value(request) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "Malformed fulfillment request");
            return (StatusCode::NOT_FOUND, Json(WebhookResponse::not_found()));
        }
    };

    let turn = request.to_turn();
    info!(
        session_id = %turn.session_id,
        intent = %request.intent_name(),
        end_of_interaction = turn.end_of_interaction,
        has_symptom = turn.has_symptom,
        "Handling turn"
    );

    let session_id = turn.session_id.clone();
    let query = turn.utterance.clone();

    let (status, response) = match state.aggregator.handle_turn(turn).await {
        Ok(TurnOutcome::Acknowledged) => (StatusCode::OK, WebhookResponse::acknowledge()),
        Ok(TurnOutcome::Completed { text, .. }) => {
            info!(session_id = %session_id, response = %text, "Conversation complete");
            (StatusCode::OK, WebhookResponse::fulfillment(text))
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Session store failure");
            (StatusCode::NOT_FOUND, WebhookResponse::not_found())
        }
    };

    if let Some(log) = state.transcripts.clone() {
        let raw = String::from_utf8_lossy(&body).into_owned();
        let reply = response.text().to_string();
        tokio::spawn(async move {
            if let Err(e) = log.save_turn(&session_id, &raw, &query, &reply).await {
                warn!(session_id = %session_id, error = %e, "Failed to save transcript");
            }
        });
    }

    (status, Json(response))
}

/// How a raw fulfillment body was classified.
#[derive(Debug, PartialEq)]
enum ParsedBody {
    /// A non-empty JSON object, ready for field extraction.
    Request(serde_json::Value),
    /// No payload: a blank body or a falsy JSON value (`{}`, `[]`, `null`,
    /// `""`, `0`, `false`). Answered with "Invalid request.".
    Empty,
    /// Not JSON, or a non-empty JSON value that is not an object.
    Malformed(String),
}

fn parse_request(body: &[u8]) -> ParsedBody {
    if body.iter().all(u8::is_ascii_whitespace) {
        return ParsedBody::Empty;
    }

    let value = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(e) => return ParsedBody::Malformed(e.to_string()),
    };

    match value {
        serde_json::Value::Object(map) if map.is_empty() => ParsedBody::Empty,
        serde_json::Value::Object(map) => ParsedBody::Request(serde_json::Value::Object(map)),
        serde_json::Value::Null | serde_json::Value::Bool(false) => ParsedBody::Empty,
        serde_json::Value::Array(ref items) if items.is_empty() => ParsedBody::Empty,
        serde_json::Value::String(ref text) if text.is_empty() => ParsedBody::Empty,
        serde_json::Value::Number(ref n) if n.as_f64() == Some(0.0) => ParsedBody::Empty,
        other => ParsedBody::Malformed(format!("expected a JSON object, got {other}")),
    }
}

// ── History ─────────────────────────────────────────────────────────────

async fn session_history(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Some(log) = state.transcripts.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Transcripts are disabled"})),
        );
    };

    match log.session_history(&id).await {
        Ok(history) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "session_id": id,
                "history": history,
            })),
        ),
        Err(e) => {
            warn!(session_id = %id, error = %e, "Failed to read transcript history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to read history"})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_falsy_bodies_are_empty() {
        for raw in ["", "  \n", "{}", "[]", "null", "\"\"", "0", "false"] {
            assert_eq!(parse_request(raw.as_bytes()), ParsedBody::Empty, "{raw:?}");
        }
    }

    #[test]
    fn unreadable_bodies_are_malformed() {
        for raw in ["not json", "{\"session\":", "[1, 2]", "\"hello\"", "7", "true"] {
            assert!(
                matches!(parse_request(raw.as_bytes()), ParsedBody::Malformed(_)),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn non_empty_object_is_a_request() {
        assert!(matches!(
            parse_request(br#"{"session": "a/b"}"#),
            ParsedBody::Request(_)
        ));
    }
}
