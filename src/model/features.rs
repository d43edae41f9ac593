//! Feature fuser — lexical TF-IDF and scaled topic features in one vector.

use tracing::debug;

use super::{FeatureScaler, TextVectorizer, TopicModel, ensure_width};
use crate::error::PredictionError;
use crate::text::TextNormalizer;

/// Weight applied to the scaled topic features at training time.
pub const DEFAULT_TOPIC_SCALING_FACTOR: f64 = 0.2;

/// Fused feature vector: topic features first, then lexical features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    topic_dims: usize,
}

impl FeatureVector {
    /// Wrap precomputed values; the first `topic_dims` entries are topic features.
    pub fn from_parts(values: Vec<f64>, topic_dims: usize) -> Self {
        let topic_dims = topic_dims.min(values.len());
        Self { values, topic_dims }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scaled topic-distribution part.
    pub fn topic_features(&self) -> &[f64] {
        &self.values[..self.topic_dims]
    }

    /// Lexical (TF-IDF) part.
    pub fn lexical_features(&self) -> &[f64] {
        &self.values[self.topic_dims..]
    }
}

/// Runs the two independent vectorizations and concatenates them.
///
/// The scaling factor and the topic-first order must match how the
/// classifier's training matrix was built.
pub struct FeatureFuser {
    normalizer: TextNormalizer,
    lexical: Box<dyn TextVectorizer>,
    bag_of_words: Box<dyn TextVectorizer>,
    topics: Box<dyn TopicModel>,
    topic_scaler: Box<dyn FeatureScaler>,
    scaling_factor: f64,
}

impl FeatureFuser {
    pub fn new(
        normalizer: TextNormalizer,
        lexical: Box<dyn TextVectorizer>,
        bag_of_words: Box<dyn TextVectorizer>,
        topics: Box<dyn TopicModel>,
        topic_scaler: Box<dyn FeatureScaler>,
        scaling_factor: f64,
    ) -> Self {
        Self {
            normalizer,
            lexical,
            bag_of_words,
            topics,
            topic_scaler,
            scaling_factor,
        }
    }

    /// Width of every vector [`FeatureFuser::fuse`] produces.
    pub fn dimension(&self) -> usize {
        self.topics.n_topics() + self.lexical.dimension()
    }

    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }

    /// Check that the components chain together.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.bag_of_words.dimension() != self.topics.n_features() {
            return Err(PredictionError::shape(
                "topic model",
                self.topics.n_features(),
                self.bag_of_words.dimension(),
            ));
        }
        if self.topic_scaler.dimension() != self.topics.n_topics() {
            return Err(PredictionError::shape(
                "topic scaler",
                self.topic_scaler.dimension(),
                self.topics.n_topics(),
            ));
        }
        Ok(())
    }

    pub fn fuse(&self, symptom_text: &str, full_text: &str) -> Result<FeatureVector, PredictionError> {
        let cleaned_symptom = self.normalizer.normalize(symptom_text);
        let cleaned_full = self.normalizer.normalize(full_text);
        debug!(
            symptom = %cleaned_symptom,
            full = %cleaned_full,
            "Normalized prediction input"
        );

        let lexical = self.lexical.transform(&cleaned_symptom)?;
        ensure_width("lexical vectorizer", self.lexical.dimension(), &lexical)?;

        let counts = self.bag_of_words.transform(&cleaned_full)?;
        let topic_distribution = self.topics.transform(&counts)?;
        let scaled = self.topic_scaler.transform(&topic_distribution)?;

        let topic_dims = scaled.len();
        let mut values = Vec::with_capacity(topic_dims + lexical.len());
        values.extend(scaled.into_iter().map(|v| v * self.scaling_factor));
        values.extend(lexical);

        Ok(FeatureVector { values, topic_dims })
    }
}
