//! Disease-prediction model — capability traits and the components behind them.
//!
//! Every pre-trained component is consumed through a narrow capability trait
//! so the prediction pipeline never depends on how a component was trained
//! or serialized. Concrete implementations load from the JSON model bundle
//! (see [`artifacts::ModelBundle`]).

pub mod artifacts;
pub mod classifier;
pub mod departments;
pub mod features;
pub mod labels;
pub mod lda;
pub mod linear;
pub mod predictor;
pub mod scaler;
pub mod vectorize;

pub use artifacts::ModelBundle;
pub use classifier::ClassifierAdapter;
pub use departments::{DepartmentResolver, FALLBACK_DEPARTMENT};
pub use features::{FeatureFuser, FeatureVector};
pub use predictor::{DiseasePredictor, Prediction};

use crate::error::PredictionError;

/// Turns normalized text into a fixed-width vector.
pub trait TextVectorizer: Send + Sync {
    /// Output width (vocabulary size).
    fn dimension(&self) -> usize;

    /// Vectorize one document.
    fn transform(&self, text: &str) -> Result<Vec<f64>, PredictionError>;
}

/// Maps a bag-of-words count vector to a topic distribution.
pub trait TopicModel: Send + Sync {
    /// Expected input width (vocabulary size of the count vectorizer).
    fn n_features(&self) -> usize;

    /// Number of latent topics (output width).
    fn n_topics(&self) -> usize;

    fn transform(&self, counts: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// Element-wise feature scaling learned at training time.
pub trait FeatureScaler: Send + Sync {
    fn dimension(&self) -> usize;

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// A trained multi-class classifier.
///
/// Probability output is a separate capability: classifiers that cannot
/// produce it keep the default `supports_proba`/`predict_proba` methods.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Expected feature width.
    fn n_features(&self) -> usize;

    /// Number of classes the classifier distinguishes.
    fn n_classes(&self) -> usize;

    /// Index of the predicted class.
    fn predict(&self, features: &[f64]) -> Result<usize, PredictionError>;

    /// Whether [`Classifier::predict_proba`] is implemented.
    fn supports_proba(&self) -> bool {
        false
    }

    /// Per-class probabilities, indexed like [`Classifier::predict`]'s output.
    fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        Err(PredictionError::UnsupportedClassifier {
            classifier: self.name().to_string(),
        })
    }
}

/// Resolves class indices to human-readable labels.
pub trait LabelDecoder: Send + Sync {
    /// All labels, in class-index order.
    fn labels(&self) -> &[String];

    fn decode(&self, index: usize) -> Option<&str> {
        self.labels().get(index).map(String::as_str)
    }
}

/// Checks that `features` has the width a component expects.
pub(crate) fn ensure_width(
    stage: &str,
    expected: usize,
    features: &[f64],
) -> Result<(), PredictionError> {
    if features.len() != expected {
        return Err(PredictionError::shape(stage, expected, features.len()));
    }
    Ok(())
}
