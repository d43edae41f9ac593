//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::session::model::SymptomPolicy;

/// Service configuration, read from `SYMPTOM_INTAKE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Port the webhook listens on.
    pub port: u16,
    /// Path to the JSON model bundle.
    pub model_path: PathBuf,
    /// Path to the transcript database.
    pub db_path: PathBuf,
    /// How symptom text is accumulated across turns.
    pub symptom_policy: SymptomPolicy,
    /// Whether turns are written to the transcript log.
    pub transcripts_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            model_path: PathBuf::from("./models/disease_predictor.json"),
            db_path: PathBuf::from("./data/symptom-intake.db"),
            symptom_policy: SymptomPolicy::default(),
            transcripts_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port: u16 = lookup("SYMPTOM_INTAKE_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let model_path = lookup("SYMPTOM_INTAKE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let db_path = lookup("SYMPTOM_INTAKE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let symptom_policy = match lookup("SYMPTOM_INTAKE_SYMPTOM_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "SYMPTOM_INTAKE_SYMPTOM_POLICY".to_string(),
                    message,
                })?,
            None => defaults.symptom_policy,
        };

        let transcripts_enabled = lookup("SYMPTOM_INTAKE_TRANSCRIPTS")
            .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"))
            .unwrap_or(defaults.transcripts_enabled);

        Ok(Self {
            port,
            model_path,
            db_path,
            symptom_policy,
            transcripts_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.symptom_policy, SymptomPolicy::Narrative);
        assert!(config.transcripts_enabled);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("SYMPTOM_INTAKE_PORT", "9000"),
            ("SYMPTOM_INTAKE_MODEL_PATH", "/srv/model.json"),
            ("SYMPTOM_INTAKE_SYMPTOM_POLICY", "marker"),
            ("SYMPTOM_INTAKE_TRANSCRIPTS", "off"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.symptom_policy, SymptomPolicy::Marker);
        assert!(!config.transcripts_enabled);
    }

    #[test]
    fn unparseable_port_falls_back() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[("SYMPTOM_INTAKE_PORT", "http")])).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[(
            "SYMPTOM_INTAKE_SYMPTOM_POLICY",
            "sometimes",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("SYMPTOM_INTAKE_SYMPTOM_POLICY"));
    }
}
