//! Standard scaler: `(x - mean) / scale` with the training-time statistics.

use super::{FeatureScaler, ensure_width};
use crate::error::{ModelError, PredictionError};

#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    dimension: usize,
}

impl StandardScaler {
    /// Either statistic may be absent (centering or scaling disabled at training time),
    /// but not both.
    pub fn new(mean: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidArtifact {
            component: "topic scaler".to_string(),
            reason: reason.to_string(),
        };

        let dimension = match (&mean, &scale) {
            (Some(m), Some(s)) if m.len() != s.len() => {
                return Err(invalid("mean and scale differ in length"));
            }
            (Some(m), _) => m.len(),
            (None, Some(s)) => s.len(),
            (None, None) => return Err(invalid("neither mean nor scale given")),
        };
        if scale
            .iter()
            .flatten()
            .any(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(invalid("scale entries must be finite and non-zero"));
        }

        Ok(Self {
            mean,
            scale,
            dimension,
        })
    }
}

impl FeatureScaler for StandardScaler {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        ensure_width("topic scaler", self.dimension, features)?;
        let mut out = features.to_vec();
        if let Some(mean) = &self.mean {
            out.iter_mut().zip(mean).for_each(|(x, m)| *x -= m);
        }
        if let Some(scale) = &self.scale {
            out.iter_mut().zip(scale).for_each(|(x, s)| *x /= s);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_and_scales() {
        let scaler = StandardScaler::new(Some(vec![0.5, 0.25]), Some(vec![0.25, 0.5])).unwrap();
        assert_eq!(scaler.transform(&[1.0, 0.25]).unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn scale_only() {
        let scaler = StandardScaler::new(None, Some(vec![2.0])).unwrap();
        assert_eq!(scaler.transform(&[3.0]).unwrap(), vec![1.5]);
    }

    #[test]
    fn rejects_zero_scale_and_mismatch() {
        assert!(StandardScaler::new(None, Some(vec![0.0])).is_err());
        assert!(StandardScaler::new(Some(vec![0.0]), Some(vec![1.0, 1.0])).is_err());
        assert!(StandardScaler::new(None, None).is_err());
    }

    #[test]
    fn width_mismatch_is_feature_error() {
        let scaler = StandardScaler::new(Some(vec![0.0, 0.0]), None).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(PredictionError::FeatureExtraction { .. })
        ));
    }
}
