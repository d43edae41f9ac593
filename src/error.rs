//! Error types for the symptom-intake service.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Transcript database errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Failures while loading the pre-trained model bundle.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model bundle: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {component} artifact: {reason}")]
    InvalidArtifact { component: String, reason: String },

    #[error("Classifier {classifier} does not support probability predictions")]
    UnsupportedClassifier { classifier: String },
}

/// Errors raised while turning text into a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Feature extraction failed in {stage}: {reason}")]
    FeatureExtraction { stage: String, reason: String },

    #[error("The classifier {classifier} does not support probability predictions")]
    UnsupportedClassifier { classifier: String },

    #[error("Predicted class index {index} is outside the {n_classes} known labels")]
    UnknownClass { index: usize, n_classes: usize },
}

impl PredictionError {
    /// Shape mismatch between a component's expected and actual input width.
    pub fn shape(stage: &str, expected: usize, actual: usize) -> Self {
        Self::FeatureExtraction {
            stage: stage.to_string(),
            reason: format!("expected {expected} features, got {actual}"),
        }
    }
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {session_id} not found")]
    NotFound { session_id: String },

    #[error("Session store failure: {0}")]
    Backend(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
