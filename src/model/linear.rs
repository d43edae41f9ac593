//! Linear classifiers: logistic regression (probabilistic) and linear SVM (scores only).

use serde::{Deserialize, Serialize};

use super::{Classifier, ensure_width};
use crate::error::{ModelError, PredictionError};

/// How logistic regression turns decision scores into probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    /// Softmax over all class scores.
    #[default]
    Multinomial,
    /// Independent sigmoids, renormalised to sum to one.
    Ovr,
}

/// Weights shared by every linear model: one row per class (or a single row for binary).
#[derive(Debug, Clone)]
struct LinearWeights {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    n_features: usize,
}

impl LinearWeights {
    fn new(component: &str, coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidArtifact {
            component: component.to_string(),
            reason,
        };
        if coef.is_empty() {
            return Err(invalid("empty coefficient matrix".to_string()));
        }
        let n_features = coef[0].len();
        if coef.iter().any(|row| row.len() != n_features) {
            return Err(invalid("ragged coefficient matrix".to_string()));
        }
        if intercept.len() != coef.len() {
            return Err(invalid(format!(
                "{} intercepts for {} coefficient rows",
                intercept.len(),
                coef.len()
            )));
        }
        Ok(Self {
            coef,
            intercept,
            n_features,
        })
    }

    /// A single coefficient row means a binary model.
    fn n_classes(&self) -> usize {
        if self.coef.len() == 1 { 2 } else { self.coef.len() }
    }

    fn decision_function(&self, stage: &str, x: &[f64]) -> Result<Vec<f64>, PredictionError> {
        ensure_width(stage, self.n_features, x)?;
        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect())
    }

    fn argmax(&self, scores: &[f64]) -> usize {
        if scores.len() == 1 {
            return usize::from(scores[0] > 0.0);
        }
        scores
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, s)| {
                if *s > best.1 { (i, *s) } else { best }
            })
            .0
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression with `predict_proba` support.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weights: LinearWeights,
    multi_class: MultiClass,
}

impl LogisticRegression {
    pub fn new(
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        multi_class: MultiClass,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            weights: LinearWeights::new("logistic regression", coef, intercept)?,
            multi_class,
        })
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.weights.n_features
    }

    fn n_classes(&self) -> usize {
        self.weights.n_classes()
    }

    fn predict(&self, features: &[f64]) -> Result<usize, PredictionError> {
        let scores = self.weights.decision_function("classifier", features)?;
        Ok(self.weights.argmax(&scores))
    }

    fn supports_proba(&self) -> bool {
        true
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let scores = self.weights.decision_function("classifier", features)?;

        if scores.len() == 1 {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }

        let proba = match self.multi_class {
            MultiClass::Multinomial => {
                let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                scores.iter().map(|s| (s - max).exp()).collect::<Vec<_>>()
            }
            MultiClass::Ovr => scores.iter().map(|s| sigmoid(*s)).collect::<Vec<_>>(),
        };
        let total: f64 = proba.iter().sum();
        Ok(proba.into_iter().map(|p| p / total).collect())
    }
}

/// Linear support vector classifier. Produces decisions but no probabilities.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    weights: LinearWeights,
}

impl LinearSvc {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, ModelError> {
        Ok(Self {
            weights: LinearWeights::new("linear svc", coef, intercept)?,
        })
    }
}

impl Classifier for LinearSvc {
    fn name(&self) -> &str {
        "linear_svc"
    }

    fn n_features(&self) -> usize {
        self.weights.n_features
    }

    fn n_classes(&self) -> usize {
        self.weights.n_classes()
    }

    fn predict(&self, features: &[f64]) -> Result<usize, PredictionError> {
        let scores = self.weights.decision_function("classifier", features)?;
        Ok(self.weights.argmax(&scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_class() -> LogisticRegression {
        LogisticRegression::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            vec![0.0, 0.0, 0.5],
            MultiClass::Multinomial,
        )
        .unwrap()
    }

    #[test]
    fn multinomial_proba_sums_to_one_and_agrees_with_predict() {
        let lr = three_class();
        let x = [0.2, 2.0];
        let proba = lr.predict_proba(&x).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        let best = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(lr.predict(&x).unwrap(), best);
        assert_eq!(best, 1);
    }

    #[test]
    fn ovr_proba_is_normalised() {
        let lr = LogisticRegression::new(
            vec![vec![1.0], vec![-1.0], vec![0.5]],
            vec![0.0, 0.0, 0.0],
            MultiClass::Ovr,
        )
        .unwrap();
        let proba = lr.predict_proba(&[3.0]).unwrap();
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(lr.predict(&[3.0]).unwrap(), 0);
    }

    #[test]
    fn binary_model_uses_sigmoid() {
        let lr = LogisticRegression::new(vec![vec![2.0]], vec![-1.0], MultiClass::Multinomial)
            .unwrap();
        assert_eq!(lr.n_classes(), 2);
        assert_eq!(lr.predict(&[1.0]).unwrap(), 1);
        assert_eq!(lr.predict(&[0.0]).unwrap(), 0);
        let proba = lr.predict_proba(&[0.5]).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-12);
        assert!((proba[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn svc_has_no_probabilities() {
        let svc = LinearSvc::new(vec![vec![1.0], vec![-1.0]], vec![0.0, 0.0]).unwrap();
        assert!(!svc.supports_proba());
        assert_eq!(svc.predict(&[1.0]).unwrap(), 0);
        assert!(matches!(
            svc.predict_proba(&[1.0]),
            Err(PredictionError::UnsupportedClassifier { .. })
        ));
    }

    #[test]
    fn width_mismatch_is_feature_error() {
        let lr = three_class();
        assert!(matches!(
            lr.predict(&[1.0]),
            Err(PredictionError::FeatureExtraction { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_intercepts() {
        assert!(
            LogisticRegression::new(vec![vec![1.0]], vec![0.0, 1.0], MultiClass::Ovr).is_err()
        );
    }
}
