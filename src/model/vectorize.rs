//! Vocabulary-based vectorizers: raw term counts and TF-IDF.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::TextVectorizer;
use crate::error::{ModelError, PredictionError};

/// Default token pattern: runs of two or more word characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// How a document is split into vocabulary terms.
#[derive(Debug, Clone)]
pub struct Tokenization {
    pattern: Regex,
    ngram_range: (usize, usize),
}

impl Tokenization {
    pub fn new(token_pattern: &str, ngram_range: (usize, usize)) -> Result<Self, ModelError> {
        let pattern = Regex::new(token_pattern).map_err(|e| ModelError::InvalidArtifact {
            component: "tokenizer".to_string(),
            reason: format!("bad token pattern: {e}"),
        })?;
        let (min_n, max_n) = ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::InvalidArtifact {
                component: "tokenizer".to_string(),
                reason: format!("bad ngram range ({min_n}, {max_n})"),
            });
        }
        Ok(Self {
            pattern,
            ngram_range,
        })
    }

    /// Terms of a document, n-grams joined with single spaces.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = self.pattern.find_iter(&lowered).map(|m| m.as_str()).collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl Default for Tokenization {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TOKEN_PATTERN).expect("default token pattern is valid"),
            ngram_range: (1, 1),
        }
    }
}

/// Validate that a vocabulary maps onto exactly `0..size`.
fn validate_vocabulary(
    component: &str,
    vocabulary: &HashMap<String, usize>,
    size: usize,
) -> Result<(), ModelError> {
    let mut seen = vec![false; size];
    for (term, &idx) in vocabulary {
        if idx >= size || seen[idx] {
            return Err(ModelError::InvalidArtifact {
                component: component.to_string(),
                reason: format!("term {term:?} has invalid or duplicate index {idx}"),
            });
        }
        seen[idx] = true;
    }
    if vocabulary.len() != size {
        return Err(ModelError::InvalidArtifact {
            component: component.to_string(),
            reason: format!("vocabulary has {} terms, expected {size}", vocabulary.len()),
        });
    }
    Ok(())
}

/// Bag-of-words vectorizer over a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    vocabulary: HashMap<String, usize>,
    tokenization: Tokenization,
}

impl CountVectorizer {
    pub fn new(
        vocabulary: HashMap<String, usize>,
        tokenization: Tokenization,
    ) -> Result<Self, ModelError> {
        validate_vocabulary("bag-of-words vectorizer", &vocabulary, vocabulary.len())?;
        Ok(Self {
            vocabulary,
            tokenization,
        })
    }

    /// Raw per-term counts. Out-of-vocabulary terms are ignored.
    pub fn counts(&self, text: &str) -> Vec<f64> {
        let mut counts = vec![0.0; self.vocabulary.len()];
        for term in self.tokenization.terms(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                counts[idx] += 1.0;
            }
        }
        counts
    }
}

impl TextVectorizer for CountVectorizer {
    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn transform(&self, text: &str) -> Result<Vec<f64>, PredictionError> {
        Ok(self.counts(text))
    }
}

/// Row normalisation applied after IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// TF-IDF vectorizer: raw counts (optionally sublinear) times IDF, then normalised.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    counter: CountVectorizer,
    idf: Vec<f64>,
    norm: Option<Norm>,
    sublinear_tf: bool,
}

impl TfIdfVectorizer {
    pub fn new(
        vocabulary: HashMap<String, usize>,
        idf: Vec<f64>,
        norm: Option<Norm>,
        sublinear_tf: bool,
        tokenization: Tokenization,
    ) -> Result<Self, ModelError> {
        validate_vocabulary("tf-idf vectorizer", &vocabulary, idf.len())?;
        if idf.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::InvalidArtifact {
                component: "tf-idf vectorizer".to_string(),
                reason: "idf weights must be finite".to_string(),
            });
        }
        Ok(Self {
            counter: CountVectorizer {
                vocabulary,
                tokenization,
            },
            idf,
            norm,
            sublinear_tf,
        })
    }
}

impl TextVectorizer for TfIdfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Result<Vec<f64>, PredictionError> {
        let mut weights = self.counter.counts(text);

        for (w, idf) in weights.iter_mut().zip(&self.idf) {
            if self.sublinear_tf && *w > 0.0 {
                *w = 1.0 + w.ln();
            }
            *w *= idf;
        }

        let magnitude = match self.norm {
            Some(Norm::L2) => weights.iter().map(|w| w * w).sum::<f64>().sqrt(),
            Some(Norm::L1) => weights.iter().map(|w| w.abs()).sum::<f64>(),
            None => 0.0,
        };
        if magnitude > 0.0 {
            for w in &mut weights {
                *w /= magnitude;
            }
        }

        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> HashMap<String, usize> {
        terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect()
    }

    #[test]
    fn default_pattern_skips_single_characters() {
        let tok = Tokenization::default();
        assert_eq!(tok.terms("a rash on my arm x"), vec!["rash", "on", "my", "arm"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let tok = Tokenization::new(DEFAULT_TOKEN_PATTERN, (1, 2)).unwrap();
        assert_eq!(
            tok.terms("high fever rash"),
            vec!["high", "fever", "rash", "high fever", "fever rash"]
        );
    }

    #[test]
    fn bad_ngram_range_rejected() {
        assert!(Tokenization::new(DEFAULT_TOKEN_PATTERN, (2, 1)).is_err());
        assert!(Tokenization::new(DEFAULT_TOKEN_PATTERN, (0, 1)).is_err());
    }

    #[test]
    fn counts_ignore_unknown_terms() {
        let cv = CountVectorizer::new(vocab(&["fever", "rash"]), Tokenization::default()).unwrap();
        assert_eq!(cv.counts("rash fever rash cough"), vec![1.0, 2.0]);
        assert_eq!(cv.transform("").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn tfidf_is_unit_length_with_l2() {
        let tfidf = TfIdfVectorizer::new(
            vocab(&["fever", "rash", "itching"]),
            vec![1.0, 2.0, 1.5],
            Some(Norm::L2),
            false,
            Tokenization::default(),
        )
        .unwrap();

        let v = tfidf.transform("rash rash fever").unwrap();
        let length: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((length - 1.0).abs() < 1e-12);
        // rash: 2 * 2.0 = 4.0, fever: 1 * 1.0 = 1.0
        assert!((v[1] / v[0] - 4.0).abs() < 1e-12);
        assert_eq!(v[2], 0.0);
    }

    #[test]
    fn tfidf_of_empty_text_is_zero() {
        let tfidf = TfIdfVectorizer::new(
            vocab(&["fever"]),
            vec![1.0],
            Some(Norm::L2),
            false,
            Tokenization::default(),
        )
        .unwrap();
        assert_eq!(tfidf.transform("").unwrap(), vec![0.0]);
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        let tfidf = TfIdfVectorizer::new(
            vocab(&["fever"]),
            vec![1.0],
            None,
            true,
            Tokenization::default(),
        )
        .unwrap();
        let v = tfidf.transform("fever fever fever").unwrap();
        assert!((v[0] - (1.0 + 3f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn vocabulary_must_match_idf() {
        let err = TfIdfVectorizer::new(
            vocab(&["fever", "rash"]),
            vec![1.0],
            None,
            false,
            Tokenization::default(),
        );
        assert!(err.is_err());
    }
}
