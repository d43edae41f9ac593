//! Session aggregator — accumulates turns and runs the predictor when a
//! conversation ends.
//!
//! Each session moves `Absent → Active → Absent`: the first turn for an id
//! creates it, every turn folds its utterance in, and the end-of-interaction
//! turn produces the recommendation and removes the session whether or not
//! the prediction succeeded.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::locks::KeyedLocks;
use super::model::{ConversationSession, SymptomPolicy, Turn};
use super::store::SessionStore;
use crate::error::SessionError;
use crate::model::{DiseasePredictor, Prediction};

/// Result of handling one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Turn recorded; the conversation continues.
    Acknowledged,
    /// Conversation ended. `prediction` is `None` when the pipeline failed
    /// and `text` carries the error message instead.
    Completed {
        text: String,
        prediction: Option<Prediction>,
    },
}

impl TurnOutcome {
    /// User-facing text, if the turn produced any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Acknowledged => None,
            Self::Completed { text, .. } => Some(text),
        }
    }
}

pub struct SessionAggregator {
    store: Arc<dyn SessionStore>,
    predictor: Arc<DiseasePredictor>,
    policy: SymptomPolicy,
    locks: KeyedLocks,
}

impl SessionAggregator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        predictor: Arc<DiseasePredictor>,
        policy: SymptomPolicy,
    ) -> Self {
        Self {
            store,
            predictor,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Apply one turn. Only session-store failures are returned as errors;
    /// prediction failures become the completion text.
    pub async fn handle_turn(&self, turn: Turn) -> Result<TurnOutcome, SessionError> {
        let _guard = self.locks.lock(&turn.session_id).await;

        let mut session = match self.store.get(&turn.session_id).await? {
            Some(session) => session,
            None => {
                debug!(session_id = %turn.session_id, "Starting new session");
                ConversationSession::new(turn.session_id.clone())
            }
        };
        session.apply(&turn, self.policy);

        if !turn.end_of_interaction {
            debug!(
                session_id = %session.session_id,
                turns = session.turn_count,
                tokens = session.token_count(),
                "Turn recorded"
            );
            self.store.upsert(session).await?;
            return Ok(TurnOutcome::Acknowledged);
        }

        let outcome = self.complete(&session).await;

        // A one-turn conversation was never persisted. A failed delete leaves
        // a stale session behind but must not cost the caller the outcome.
        match self.store.delete(&session.session_id).await {
            Ok(_) | Err(SessionError::NotFound { .. }) => {}
            Err(e) => {
                warn!(session_id = %session.session_id, error = %e, "Failed to clear session");
            }
        }

        Ok(outcome)
    }

    /// Run the predictor off the async workers; inference is CPU-bound.
    async fn complete(&self, session: &ConversationSession) -> TurnOutcome {
        let predictor = Arc::clone(&self.predictor);
        let symptom_text = session.symptom_text.trim().to_string();
        let full_text = session.full_text.trim().to_string();

        let result = tokio::task::spawn_blocking(move || predictor.predict(&symptom_text, &full_text))
            .await
            .map_err(|e| format!("prediction task failed: {e}"))
            .and_then(|r| r.map_err(|e| e.to_string()));

        match result {
            Ok(prediction) => {
                info!(
                    session_id = %session.session_id,
                    turns = session.turn_count,
                    started_at = %session.started_at,
                    disease = %prediction.disease,
                    probability = prediction.probability,
                    department = %prediction.department,
                    "Prediction complete"
                );
                TurnOutcome::Completed {
                    text: prediction.recommendation(),
                    prediction: Some(prediction),
                }
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    started_at = %session.started_at,
                    error = %e,
                    "Prediction failed"
                );
                TurnOutcome::Completed {
                    text: format!("Error during prediction: {e}"),
                    prediction: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::model::artifacts::{ClassifierArtifact, FIXTURE_BUNDLE};
    use crate::model::{ClassifierAdapter, FeatureFuser, ModelBundle};
    use crate::session::store::InMemorySessionStore;
    use crate::text::TextNormalizer;

    fn predictor() -> Arc<DiseasePredictor> {
        let bundle = ModelBundle::from_json(FIXTURE_BUNDLE).unwrap();
        Arc::new(DiseasePredictor::from_bundle(&bundle).unwrap())
    }

    /// Predictor assembled around a classifier with no probability output,
    /// bypassing the load-time capability check.
    fn predictor_without_proba() -> Arc<DiseasePredictor> {
        let bundle = ModelBundle::from_json(FIXTURE_BUNDLE).unwrap();
        let (coef, intercept) = match &bundle.classifier {
            ClassifierArtifact::LogisticRegression {
                coef, intercept, ..
            } => (coef.clone(), intercept.clone()),
            ClassifierArtifact::LinearSvc { coef, intercept } => (coef.clone(), intercept.clone()),
        };
        let svc = ClassifierArtifact::LinearSvc { coef, intercept };

        let fuser = FeatureFuser::new(
            TextNormalizer::new(),
            Box::new(bundle.tfidf.build().unwrap()),
            Box::new(bundle.bow.build().unwrap()),
            Box::new(bundle.lda.build().unwrap()),
            Box::new(bundle.scaler.build().unwrap()),
            bundle.scaling_factor,
        );
        let adapter = ClassifierAdapter::new(
            svc.build().unwrap(),
            Box::new(bundle.label_encoder.build().unwrap()),
        );
        Arc::new(DiseasePredictor::from_parts(fuser, adapter))
    }

    fn aggregator(policy: SymptomPolicy) -> (SessionAggregator, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let agg = SessionAggregator::new(store.clone(), predictor(), policy);
        (agg, store)
    }

    #[tokio::test]
    async fn two_turn_conversation_ends_with_recommendation() {
        let (agg, store) = aggregator(SymptomPolicy::Narrative);

        let first = agg.handle_turn(Turn::new("s1", "I have a fever")).await.unwrap();
        assert_eq!(first, TurnOutcome::Acknowledged);
        let active = store.get("s1").await.unwrap().unwrap();
        assert!(active.full_text.contains("I have a fever"));

        let second = agg
            .handle_turn(Turn::new("s1", "rash on arms").with_symptom().ending())
            .await
            .unwrap();

        let TurnOutcome::Completed { text, prediction } = second else {
            panic!("expected completion");
        };
        let prediction = prediction.unwrap();
        assert_eq!(prediction.disease, "Psoriasis");
        assert_eq!(prediction.department, "Dermatology");
        assert!(text.starts_with("You have a "));
        assert!(text.contains("% chance of having Psoriasis"));
        assert!(text.ends_with("visit the Dermatology department for further assistance."));

        let pct = text
            .trim_start_matches("You have a ")
            .split('%')
            .next()
            .unwrap();
        assert_eq!(pct.split('.').nth(1).map(str::len), Some(2), "{pct}");

        assert_eq!(store.get("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn start_time_is_kept_across_turns() {
        let (agg, store) = aggregator(SymptomPolicy::Narrative);
        agg.handle_turn(Turn::new("t", "fever")).await.unwrap();
        let started = store.get("t").await.unwrap().unwrap().started_at;

        agg.handle_turn(Turn::new("t", "chills")).await.unwrap();
        let session = store.get("t").await.unwrap().unwrap();
        assert_eq!(session.started_at, started);
        assert!(session.started_at <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn end_on_unseen_id_predicts_from_single_turn() {
        let (agg, store) = aggregator(SymptomPolicy::Narrative);

        let outcome = agg
            .handle_turn(Turn::new("fresh", "high fever and joint pain").with_symptom().ending())
            .await
            .unwrap();

        let TurnOutcome::Completed { prediction, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(prediction.unwrap().disease, "Dengue");
        assert_eq!(store.get("fresh").await.unwrap(), None);
    }

    #[tokio::test]
    async fn prediction_failure_is_reported_and_session_cleared() {
        let store = Arc::new(InMemorySessionStore::new());
        let agg = SessionAggregator::new(
            store.clone(),
            predictor_without_proba(),
            SymptomPolicy::Narrative,
        );

        agg.handle_turn(Turn::new("s2", "itchy skin").with_symptom())
            .await
            .unwrap();
        let outcome = agg.handle_turn(Turn::new("s2", "").ending()).await.unwrap();

        let TurnOutcome::Completed { text, prediction } = outcome else {
            panic!("expected completion");
        };
        assert!(prediction.is_none());
        assert!(text.starts_with("Error during prediction: "), "{text}");
        assert_eq!(store.get("s2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn marker_policy_still_predicts() {
        let (agg, _store) = aggregator(SymptomPolicy::Marker);
        agg.handle_turn(Turn::new("m", "sneezing a lot").with_symptom())
            .await
            .unwrap();
        let outcome = agg.handle_turn(Turn::new("m", "").ending()).await.unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Completed {
                prediction: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_turns_lose_no_updates() {
        let (agg, store) = aggregator(SymptomPolicy::Narrative);
        let agg = Arc::new(agg);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let agg = Arc::clone(&agg);
                tokio::spawn(async move {
                    agg.handle_turn(Turn::new("busy", format!("word{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap(), TurnOutcome::Acknowledged);
        }

        let session = store.get("busy").await.unwrap().unwrap();
        assert_eq!(session.turn_count, 32);
        assert_eq!(session.token_count(), 32);
        for i in 0..32 {
            assert!(session.full_text.split(' ').any(|w| w == format!("word{i}")));
        }
        assert!(agg.locks.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let (agg, store) = aggregator(SymptomPolicy::Narrative);
        agg.handle_turn(Turn::new("a", "fever")).await.unwrap();
        agg.handle_turn(Turn::new("b", "rash")).await.unwrap();
        agg.handle_turn(Turn::new("a", "").ending()).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().unwrap().full_text, "rash");
    }

    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _: &str) -> Result<Option<ConversationSession>, SessionError> {
            Err(SessionError::Backend("store offline".into()))
        }
        async fn upsert(&self, _: ConversationSession) -> Result<(), SessionError> {
            Err(SessionError::Backend("store offline".into()))
        }
        async fn delete(&self, id: &str) -> Result<ConversationSession, SessionError> {
            Err(SessionError::NotFound {
                session_id: id.to_string(),
            })
        }
        async fn len(&self) -> Result<usize, SessionError> {
            Ok(0)
        }
    }

    /// In-memory store whose deletes always fail with a backend error.
    struct StickyStore {
        inner: InMemorySessionStore,
    }

    #[async_trait]
    impl SessionStore for StickyStore {
        async fn get(&self, id: &str) -> Result<Option<ConversationSession>, SessionError> {
            self.inner.get(id).await
        }
        async fn upsert(&self, session: ConversationSession) -> Result<(), SessionError> {
            self.inner.upsert(session).await
        }
        async fn delete(&self, _: &str) -> Result<ConversationSession, SessionError> {
            Err(SessionError::Backend("delete refused".into()))
        }
        async fn len(&self) -> Result<usize, SessionError> {
            self.inner.len().await
        }
    }

    #[tokio::test]
    async fn failed_clear_still_returns_prediction() {
        let store = Arc::new(StickyStore {
            inner: InMemorySessionStore::new(),
        });
        let agg = SessionAggregator::new(store.clone(), predictor(), SymptomPolicy::Narrative);

        agg.handle_turn(Turn::new("d", "I have a fever")).await.unwrap();
        let outcome = agg
            .handle_turn(Turn::new("d", "rash on arms").with_symptom().ending())
            .await
            .unwrap();

        let TurnOutcome::Completed { text, prediction } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(prediction.unwrap().disease, "Psoriasis");
        assert!(text.starts_with("You have a "), "{text}");
        assert!(store.get("d").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn prediction_runs_on_multi_thread_runtime() {
        let (agg, _store) = aggregator(SymptomPolicy::Narrative);
        let agg = Arc::new(agg);

        let handles: Vec<_> = ["p0", "p1", "p2", "p3"]
            .into_iter()
            .map(|id| {
                let agg = Arc::clone(&agg);
                tokio::spawn(async move {
                    agg.handle_turn(Turn::new(id, "high fever and joint pain").with_symptom().ending())
                        .await
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            let TurnOutcome::Completed { prediction, .. } = h.await.unwrap() else {
                panic!("expected completion");
            };
            assert_eq!(prediction.unwrap().disease, "Dengue");
        }
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let agg = SessionAggregator::new(Arc::new(BrokenStore), predictor(), SymptomPolicy::Narrative);
        assert!(matches!(
            agg.handle_turn(Turn::new("x", "hi")).await,
            Err(SessionError::Backend(_))
        ));
    }
}
