//! Dialogflow ES fulfillment request and response shapes.

use serde::{Deserialize, Serialize};

use crate::session::Turn;

/// Session id used when the request carries none.
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Inbound fulfillment request. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookRequest {
    /// Full session path, e.g. `projects/p/agent/sessions/abc123`.
    pub session: Option<String>,
    pub query_result: QueryResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    pub query_text: String,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    pub intent: Intent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub display_name: String,
    pub end_interaction: bool,
}

impl WebhookRequest {
    /// Last `/` segment of the session path.
    pub fn session_id(&self) -> &str {
        match self.session.as_deref() {
            Some(path) => path.rsplit('/').next().unwrap_or(path),
            None => DEFAULT_SESSION_ID,
        }
    }

    /// Whether the `symptom` slot holds a value: a non-empty list or a non-empty string.
    pub fn has_symptom(&self) -> bool {
        match self.query_result.parameters.get("symptom") {
            Some(serde_json::Value::Array(items)) => !items.is_empty(),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn intent_name(&self) -> &str {
        &self.query_result.intent.display_name
    }

    pub fn to_turn(&self) -> Turn {
        Turn {
            session_id: self.session_id().to_string(),
            utterance: self.query_result.query_text.clone(),
            has_symptom: self.has_symptom(),
            end_of_interaction: self.query_result.intent.end_interaction,
        }
    }
}

/// Fulfillment response. An empty object means "continue the conversation".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl WebhookResponse {
    /// `{}`
    pub fn acknowledge() -> Self {
        Self::default()
    }

    /// `{"fulfillmentText": text, "source": "webhook"}`
    pub fn fulfillment(text: impl Into<String>) -> Self {
        Self {
            fulfillment_text: Some(text.into()),
            source: Some("webhook".to_string()),
        }
    }

    /// `{"fulfillmentText": "Invalid request."}`
    pub fn invalid_request() -> Self {
        Self {
            fulfillment_text: Some("Invalid request.".to_string()),
            source: None,
        }
    }

    /// Body sent with a 404 when the turn could not be processed.
    pub fn not_found() -> Self {
        Self::fulfillment("Sorry, I couldn't find that information.")
    }

    pub fn text(&self) -> &str {
        self.fulfillment_text.as_deref().unwrap_or_default()
    }
}
