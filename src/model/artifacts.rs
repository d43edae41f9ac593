//! Model bundle — the serialized pre-trained components loaded at startup.
//!
//! One JSON document carries every component the predictor needs:
//!
//! ```json
//! {
//!   "tfidf":         { "vocabulary": {"rash": 0}, "idf": [1.7], "norm": "l2" },
//!   "bow":           { "vocabulary": {"fever": 0} },
//!   "lda":           { "components": [[3.1], [0.4]] },
//!   "scaler":        { "mean": [0.5, 0.5], "scale": [0.2, 0.2] },
//!   "classifier":    { "kind": "logistic_regression", "coef": [[...]], "intercept": [...] },
//!   "label_encoder": { "classes": ["Acne", "..."] },
//!   "scaling_factor": 0.2
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Classifier;
use super::features::DEFAULT_TOPIC_SCALING_FACTOR;
use super::labels::LabelEncoder;
use super::lda::LatentDirichletAllocation;
use super::linear::{LinearSvc, LogisticRegression, MultiClass};
use super::scaler::StandardScaler;
use super::vectorize::{
    CountVectorizer, DEFAULT_TOKEN_PATTERN, Norm, TfIdfVectorizer, Tokenization,
};
use crate::error::ModelError;

/// Small three-class bundle shared by the unit tests.
#[cfg(test)]
pub(crate) const FIXTURE_BUNDLE: &str = include_str!("../../tests/fixtures/disease_predictor.json");

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_scaling_factor() -> f64 {
    DEFAULT_TOPIC_SCALING_FACTOR
}

fn default_max_doc_update_iter() -> usize {
    100
}

fn default_mean_change_tol() -> f64 {
    1e-3
}

/// Tokenizer settings shared by both vectorizers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizationArtifact {
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
}

impl Default for TokenizationArtifact {
    fn default() -> Self {
        Self {
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
        }
    }
}

impl TokenizationArtifact {
    fn build(&self) -> Result<Tokenization, ModelError> {
        Tokenization::new(&self.token_pattern, self.ngram_range)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(flatten)]
    pub tokenization: TokenizationArtifact,
}

impl TfIdfArtifact {
    pub fn build(&self) -> Result<TfIdfVectorizer, ModelError> {
        TfIdfVectorizer::new(
            self.vocabulary.clone(),
            self.idf.clone(),
            self.norm,
            self.sublinear_tf,
            self.tokenization.build()?,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(flatten)]
    pub tokenization: TokenizationArtifact,
}

impl CountArtifact {
    pub fn build(&self) -> Result<CountVectorizer, ModelError> {
        CountVectorizer::new(self.vocabulary.clone(), self.tokenization.build()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaArtifact {
    /// Topic-word pseudo-counts, one row per topic.
    pub components: Vec<Vec<f64>>,
    #[serde(default)]
    pub doc_topic_prior: Option<f64>,
    #[serde(default = "default_max_doc_update_iter")]
    pub max_doc_update_iter: usize,
    #[serde(default = "default_mean_change_tol")]
    pub mean_change_tol: f64,
}

impl LdaArtifact {
    pub fn build(&self) -> Result<LatentDirichletAllocation, ModelError> {
        LatentDirichletAllocation::new(
            self.components.clone(),
            self.doc_topic_prior,
            self.max_doc_update_iter,
            self.mean_change_tol,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl ScalerArtifact {
    pub fn build(&self) -> Result<StandardScaler, ModelError> {
        StandardScaler::new(self.mean.clone(), self.scale.clone())
    }
}

/// Supported classifier families.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        multi_class: MultiClass,
    },
    LinearSvc {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

impl ClassifierArtifact {
    pub fn build(&self) -> Result<Box<dyn Classifier>, ModelError> {
        let classifier: Box<dyn Classifier> = match self {
            Self::LogisticRegression {
                coef,
                intercept,
                multi_class,
            } => Box::new(LogisticRegression::new(
                coef.clone(),
                intercept.clone(),
                *multi_class,
            )?),
            Self::LinearSvc { coef, intercept } => {
                Box::new(LinearSvc::new(coef.clone(), intercept.clone())?)
            }
        };
        Ok(classifier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoderArtifact {
    pub classes: Vec<String>,
}

impl LabelEncoderArtifact {
    pub fn build(&self) -> Result<LabelEncoder, ModelError> {
        LabelEncoder::new(self.classes.clone())
    }
}

/// Every pre-trained component plus the topic scaling factor used at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub tfidf: TfIdfArtifact,
    pub bow: CountArtifact,
    pub lda: LdaArtifact,
    pub scaler: ScalerArtifact,
    pub classifier: ClassifierArtifact,
    pub label_encoder: LabelEncoderArtifact,
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,
}

impl ModelBundle {
    /// Read and parse a bundle from disk.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        let bundle = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            classes = bundle.label_encoder.classes.len(),
            vocabulary = bundle.tfidf.idf.len(),
            topics = bundle.lda.components.len(),
            "Model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let bundle: Self = serde_json::from_str(raw)?;
        if !bundle.scaling_factor.is_finite() {
            return Err(ModelError::InvalidArtifact {
                component: "bundle".to_string(),
                reason: "scaling_factor must be finite".to_string(),
            });
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_take_defaults() {
        let bundle = ModelBundle::from_json(
            r#"{
                "tfidf": {"vocabulary": {"rash": 0}, "idf": [1.0]},
                "bow": {"vocabulary": {"fever": 0}},
                "lda": {"components": [[1.0], [2.0]]},
                "scaler": {"mean": [0.5, 0.5]},
                "classifier": {"kind": "logistic_regression", "coef": [[1.0, 1.0, 1.0]], "intercept": [0.0]},
                "label_encoder": {"classes": ["Acne", "Allergy"]}
            }"#,
        )
        .unwrap();

        assert_eq!(bundle.scaling_factor, DEFAULT_TOPIC_SCALING_FACTOR);
        assert_eq!(bundle.tfidf.norm, Some(Norm::L2));
        assert_eq!(bundle.tfidf.tokenization.ngram_range, (1, 1));
        assert_eq!(bundle.lda.max_doc_update_iter, 100);
        assert!(matches!(
            bundle.classifier,
            ClassifierArtifact::LogisticRegression {
                multi_class: MultiClass::Multinomial,
                ..
            }
        ));
    }

    #[test]
    fn explicit_null_norm_disables_normalisation() {
        let artifact: TfIdfArtifact =
            serde_json::from_str(r#"{"vocabulary": {"rash": 0}, "idf": [1.0], "norm": null}"#)
                .unwrap();
        assert_eq!(artifact.norm, None);
    }

    #[test]
    fn unknown_classifier_kind_is_a_parse_error() {
        let err = serde_json::from_str::<ClassifierArtifact>(
            r#"{"kind": "random_forest", "trees": []}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ModelBundle::from_path(Path::new("/nonexistent/bundle.json")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
