//! Latent Dirichlet Allocation topic model (inference only).
//!
//! `transform` runs the per-document variational E-step against the trained
//! topic-word pseudo-counts and returns the normalised document-topic
//! distribution.

use super::{TopicModel, ensure_width};
use crate::error::{ModelError, PredictionError};

/// Machine epsilon, keeps the `phi` normaliser away from zero.
const EPS: f64 = f64::EPSILON;

/// Trained LDA model.
#[derive(Debug, Clone)]
pub struct LatentDirichletAllocation {
    /// `exp(E[log beta])` per topic, precomputed from the topic-word pseudo-counts.
    exp_dirichlet_component: Vec<Vec<f64>>,
    n_features: usize,
    doc_topic_prior: f64,
    max_doc_update_iter: usize,
    mean_change_tol: f64,
}

impl LatentDirichletAllocation {
    /// Build from `components` (topics × vocabulary pseudo-counts).
    ///
    /// `doc_topic_prior` defaults to `1 / n_topics` when `None`.
    pub fn new(
        components: Vec<Vec<f64>>,
        doc_topic_prior: Option<f64>,
        max_doc_update_iter: usize,
        mean_change_tol: f64,
    ) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidArtifact {
            component: "topic model".to_string(),
            reason,
        };

        let n_topics = components.len();
        if n_topics == 0 {
            return Err(invalid("no topics".to_string()));
        }
        let n_features = components[0].len();
        if components.iter().any(|row| row.len() != n_features) {
            return Err(invalid("ragged components matrix".to_string()));
        }
        if components
            .iter()
            .flatten()
            .any(|c| !c.is_finite() || *c <= 0.0)
        {
            return Err(invalid("components must be positive".to_string()));
        }

        let doc_topic_prior = doc_topic_prior.unwrap_or(1.0 / n_topics as f64);
        if doc_topic_prior <= 0.0 {
            return Err(invalid(format!("doc_topic_prior {doc_topic_prior} must be positive")));
        }

        let exp_dirichlet_component = components
            .iter()
            .map(|row| exp_dirichlet_expectation(row))
            .collect();

        Ok(Self {
            exp_dirichlet_component,
            n_features,
            doc_topic_prior,
            max_doc_update_iter,
            mean_change_tol,
        })
    }
}

impl TopicModel for LatentDirichletAllocation {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_topics(&self) -> usize {
        self.exp_dirichlet_component.len()
    }

    fn transform(&self, counts: &[f64]) -> Result<Vec<f64>, PredictionError> {
        ensure_width("topic model", self.n_features, counts)?;
        if counts.iter().any(|c| *c < 0.0 || !c.is_finite()) {
            return Err(PredictionError::FeatureExtraction {
                stage: "topic model".to_string(),
                reason: "word counts must be non-negative".to_string(),
            });
        }

        let n_topics = self.n_topics();
        let words: Vec<(usize, f64)> = counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0.0)
            .map(|(i, c)| (i, *c))
            .collect();

        let mut doc_topic = vec![1.0; n_topics];
        let mut exp_doc_topic = exp_dirichlet_expectation(&doc_topic);

        for _ in 0..self.max_doc_update_iter {
            let last = doc_topic.clone();

            let mut weighted = vec![0.0; n_topics];
            for &(w, count) in &words {
                let norm_phi: f64 = (0..n_topics)
                    .map(|k| exp_doc_topic[k] * self.exp_dirichlet_component[k][w])
                    .sum::<f64>()
                    + EPS;
                for (k, acc) in weighted.iter_mut().enumerate() {
                    *acc += count / norm_phi * self.exp_dirichlet_component[k][w];
                }
            }

            for k in 0..n_topics {
                doc_topic[k] = exp_doc_topic[k] * weighted[k] + self.doc_topic_prior;
            }
            exp_doc_topic = exp_dirichlet_expectation(&doc_topic);

            let mean_change = doc_topic
                .iter()
                .zip(&last)
                .map(|(a, b)| (a - b).abs())
                .sum::<f64>()
                / n_topics as f64;
            if mean_change < self.mean_change_tol {
                break;
            }
        }

        let total: f64 = doc_topic.iter().sum();
        Ok(doc_topic.into_iter().map(|v| v / total).collect())
    }
}

/// `exp(psi(alpha_k) - psi(sum(alpha)))` for one Dirichlet parameter vector.
fn exp_dirichlet_expectation(alpha: &[f64]) -> Vec<f64> {
    let psi_total = digamma(alpha.iter().sum());
    alpha.iter().map(|a| (digamma(*a) - psi_total).exp()).collect()
}

/// Digamma function for positive arguments (recurrence plus asymptotic series).
pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}
