//! Session data model — conversation state and inbound turns.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the symptom text of a session is built from its turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomPolicy {
    /// Concatenate the utterances of turns that carried a symptom slot value.
    #[default]
    Narrative,
    /// Overwrite with `"1"` or `"0"` each turn, marking whether the turn carried a symptom.
    Marker,
}

impl fmt::Display for SymptomPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narrative => write!(f, "narrative"),
            Self::Marker => write!(f, "marker"),
        }
    }
}

impl FromStr for SymptomPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "narrative" => Ok(Self::Narrative),
            "marker" => Ok(Self::Marker),
            other => Err(format!(
                "unknown symptom policy '{other}' (expected 'narrative' or 'marker')"
            )),
        }
    }
}

/// One inbound message of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub session_id: String,
    /// Raw user text; may be empty.
    pub utterance: String,
    /// Whether the turn carried a symptom slot value.
    pub has_symptom: bool,
    /// Whether the turn concludes the conversation.
    pub end_of_interaction: bool,
}

impl Turn {
    pub fn new(session_id: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            utterance: utterance.into(),
            has_symptom: false,
            end_of_interaction: false,
        }
    }

    pub fn with_symptom(mut self) -> Self {
        self.has_symptom = true;
        self
    }

    pub fn ending(mut self) -> Self {
        self.end_of_interaction = true;
        self
    }
}

/// Accumulated state of one conversation, alive from its first turn until
/// the end-of-interaction turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    /// Every non-empty utterance, in arrival order, space-joined.
    pub full_text: String,
    /// Symptom-bearing text, built per [`SymptomPolicy`].
    pub symptom_text: String,
    pub turn_count: u32,
    pub started_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Fresh session with empty text.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            full_text: String::new(),
            symptom_text: String::new(),
            turn_count: 0,
            started_at: Utc::now(),
        }
    }

    /// Fold one turn's utterance and symptom flag into the session.
    pub fn apply(&mut self, turn: &Turn, policy: SymptomPolicy) {
        let utterance = turn.utterance.as_str();

        if !utterance.is_empty() {
            append_spaced(&mut self.full_text, utterance);
        }

        match policy {
            SymptomPolicy::Narrative => {
                if turn.has_symptom && !utterance.is_empty() {
                    append_spaced(&mut self.symptom_text, utterance);
                }
            }
            SymptomPolicy::Marker => {
                self.symptom_text = if turn.has_symptom { "1" } else { "0" }.to_string();
            }
        }

        self.turn_count += 1;
    }

    /// Number of whitespace-separated tokens in `full_text`.
    pub fn token_count(&self) -> usize {
        self.full_text.split_whitespace().count()
    }
}

fn append_spaced(buf: &mut String, text: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}
