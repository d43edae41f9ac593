//! Label encoder — maps class indices back to disease names.

use std::collections::HashSet;

use super::LabelDecoder;
use crate::error::ModelError;

/// Class labels in index order, as fitted at training time.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::InvalidArtifact {
                component: "label encoder".to_string(),
                reason: "no classes".to_string(),
            });
        }
        let unique: HashSet<&String> = classes.iter().collect();
        if unique.len() != classes.len() {
            return Err(ModelError::InvalidArtifact {
                component: "label encoder".to_string(),
                reason: "duplicate class labels".to_string(),
            });
        }
        Ok(Self { classes })
    }
}

impl LabelDecoder for LabelEncoder {
    fn labels(&self) -> &[String] {
        &self.classes
    }
}
