//! Symptom Intake — conversational disease-prediction webhook.

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod text;
pub mod webhook;
