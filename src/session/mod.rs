//! Conversation sessions — per-id state accumulated across webhook turns.

pub mod aggregator;
pub mod locks;
pub mod model;
pub mod store;

pub use aggregator::{SessionAggregator, TurnOutcome};
pub use locks::KeyedLocks;
pub use model::{ConversationSession, SymptomPolicy, Turn};
pub use store::{InMemorySessionStore, SessionStore};
