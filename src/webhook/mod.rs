//! Webhook surface — axum router in front of the session aggregator.

pub mod routes;
pub mod types;

pub use routes::{AppState, webhook_routes};
pub use types::{WebhookRequest, WebhookResponse};
