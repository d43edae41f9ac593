//! Classifier adapter — top label plus its probability.

use super::features::FeatureVector;
use super::{Classifier, LabelDecoder};
use crate::error::PredictionError;

/// Wraps a trained classifier together with its label decoder.
pub struct ClassifierAdapter {
    classifier: Box<dyn Classifier>,
    labels: Box<dyn LabelDecoder>,
}

impl ClassifierAdapter {
    pub fn new(classifier: Box<dyn Classifier>, labels: Box<dyn LabelDecoder>) -> Self {
        Self { classifier, labels }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn n_features(&self) -> usize {
        self.classifier.n_features()
    }

    pub fn n_classes(&self) -> usize {
        self.classifier.n_classes()
    }

    /// The closed set of labels this adapter can return.
    pub fn labels(&self) -> &[String] {
        self.labels.labels()
    }

    pub fn supports_proba(&self) -> bool {
        self.classifier.supports_proba()
    }

    /// Predicted label and the probability the classifier assigns to it.
    pub fn classify(&self, features: &FeatureVector) -> Result<(String, f64), PredictionError> {
        let x = features.as_slice();
        let index = self.classifier.predict(x)?;

        let n_classes = self.labels.labels().len();
        let label = self
            .labels
            .decode(index)
            .ok_or(PredictionError::UnknownClass { index, n_classes })?
            .to_string();

        if !self.classifier.supports_proba() {
            return Err(PredictionError::UnsupportedClassifier {
                classifier: self.classifier.name().to_string(),
            });
        }
        let proba = self.classifier.predict_proba(x)?;
        let probability = proba
            .get(index)
            .copied()
            .ok_or(PredictionError::UnknownClass {
                index,
                n_classes: proba.len(),
            })?;

        Ok((label, probability.clamp(0.0, 1.0)))
    }
}
