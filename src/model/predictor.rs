//! Disease predictor — feature fusion, classification, and department lookup.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::artifacts::ModelBundle;
use super::classifier::ClassifierAdapter;
use super::departments::DepartmentResolver;
use super::features::FeatureFuser;
use crate::error::{ModelError, PredictionError};
use crate::text::TextNormalizer;

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub disease: String,
    /// Probability of `disease`, in `[0, 1]`.
    pub probability: f64,
    pub department: String,
}

impl Prediction {
    /// User-facing recommendation with the probability as a two-decimal percentage.
    pub fn recommendation(&self) -> String {
        format!(
            "You have a {:.2}% chance of having {}, so we recommend that you visit the {} department for further assistance.",
            self.probability * 100.0,
            self.disease,
            self.department
        )
    }
}

/// The full prediction pipeline. Immutable once built; safe to share across tasks.
pub struct DiseasePredictor {
    fuser: FeatureFuser,
    adapter: ClassifierAdapter,
    departments: DepartmentResolver,
}

impl DiseasePredictor {
    /// Assemble a predictor without validating it.
    ///
    /// Prefer [`DiseasePredictor::from_bundle`], which also runs
    /// [`DiseasePredictor::validate`] and [`DiseasePredictor::ensure_capabilities`].
    pub fn from_parts(fuser: FeatureFuser, adapter: ClassifierAdapter) -> Self {
        Self {
            fuser,
            adapter,
            departments: DepartmentResolver::new(),
        }
    }

    /// Build every component from a bundle and check that they fit together.
    pub fn from_bundle(bundle: &ModelBundle) -> Result<Self, ModelError> {
        let fuser = FeatureFuser::new(
            TextNormalizer::new(),
            Box::new(bundle.tfidf.build()?),
            Box::new(bundle.bow.build()?),
            Box::new(bundle.lda.build()?),
            Box::new(bundle.scaler.build()?),
            bundle.scaling_factor,
        );
        let adapter = ClassifierAdapter::new(
            bundle.classifier.build()?,
            Box::new(bundle.label_encoder.build()?),
        );

        let predictor = Self::from_parts(fuser, adapter);
        predictor.validate()?;
        predictor.ensure_capabilities()?;

        info!(
            classifier = predictor.adapter.classifier_name(),
            features = predictor.fuser.dimension(),
            labels = predictor.labels().len(),
            scaling_factor = predictor.fuser.scaling_factor(),
            "Disease predictor ready"
        );
        Ok(predictor)
    }

    /// Read a bundle from disk and build a validated predictor.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bundle = ModelBundle::from_path(path)?;
        Self::from_bundle(&bundle)
    }

    /// Shape checks across component boundaries.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.fuser
            .validate()
            .map_err(|e| ModelError::InvalidArtifact {
                component: "feature pipeline".to_string(),
                reason: e.to_string(),
            })?;

        if self.fuser.dimension() != self.adapter.n_features() {
            return Err(ModelError::InvalidArtifact {
                component: "classifier".to_string(),
                reason: format!(
                    "expects {} features but the pipeline produces {}",
                    self.adapter.n_features(),
                    self.fuser.dimension()
                ),
            });
        }
        if self.adapter.n_classes() != self.adapter.labels().len() {
            return Err(ModelError::InvalidArtifact {
                component: "label encoder".to_string(),
                reason: format!(
                    "{} labels for a {}-class classifier",
                    self.adapter.labels().len(),
                    self.adapter.n_classes()
                ),
            });
        }
        Ok(())
    }

    /// Probability output is mandatory: every response reports a percentage.
    pub fn ensure_capabilities(&self) -> Result<(), ModelError> {
        if !self.adapter.supports_proba() {
            return Err(ModelError::UnsupportedClassifier {
                classifier: self.adapter.classifier_name().to_string(),
            });
        }
        Ok(())
    }

    /// Every label the predictor can return.
    pub fn labels(&self) -> &[String] {
        self.adapter.labels()
    }

    pub fn predict(&self, symptom_text: &str, full_text: &str) -> Result<Prediction, PredictionError> {
        let features = self.fuser.fuse(symptom_text, full_text)?;
        let (disease, probability) = self.adapter.classify(&features)?;
        let department = self.departments.resolve(&disease).to_string();

        Ok(Prediction {
            disease,
            probability,
            department,
        })
    }
}
